//! Display names for Battlefield 3 map and game mode identifiers

/// Map identifier to display name, base game and expansion packs
pub const MAP_NAMES: &[(&str, &str)] = &[
    ("MP_001", "Grand Bazaar"),
    ("MP_003", "Teheran Highway"),
    ("MP_007", "Caspian Border"),
    ("MP_011", "Seine Crossing"),
    ("MP_012", "Operation Firestorm"),
    ("MP_013", "Damavand Peak"),
    ("MP_017", "Noshahr Canals"),
    ("MP_018", "Kharg Island"),
    ("MP_Subway", "Operation Metro"),
    ("XP1_001", "Strike At Karkand"),
    ("XP1_002", "Gulf of Oman"),
    ("XP1_003", "Sharqi Peninsula"),
    ("XP1_004", "Wake Island"),
    ("XP2_Factory", "Scrapmetal"),
    ("XP2_Office", "Operation 925"),
    ("XP2_Palace", "Donya Fortress"),
    ("XP2_Skybar", "Ziba Tower"),
    ("XP3_Desert", "Bandar Desert"),
    ("XP3_Alborz", "Alborz Mountains"),
    ("XP3_Shield", "Armored Shield"),
    ("XP3_Valley", "Death Valley"),
    ("XP4_Quake", "Epicenter"),
    ("XP4_FD", "Markaz Monolith"),
    ("XP4_Parl", "Azadi Palace"),
    ("XP4_Rubble", "Talah Market"),
    ("XP5_001", "Operation Riverside"),
    ("XP5_002", "Nebandan Flats"),
    ("XP5_003", "Kiasar Railroad"),
    ("XP5_004", "Sabalan Pipeline"),
];

/// Game mode identifier to display name
pub const GAME_MODE_NAMES: &[(&str, &str)] = &[
    ("ConquestLarge0", "Conquest64"),
    ("ConquestSmall0", "Conquest"),
    ("ConquestAssaultLarge0", "Conquest Assault64"),
    ("ConquestAssaultSmall0", "Conquest Assault"),
    ("ConquestAssaultSmall1", "Conquest Assault: Day 2"),
    ("RushLarge0", "Rush"),
    ("SquadRush0", "Squad Rush"),
    ("SquadDeathMatch0", "Squad Deathmatch"),
    ("TeamDeathMatch0", "Team Deathmatch"),
    ("TeamDeathMatchC0", "TDM Close Quarters"),
    ("Domination0", "Conquest Domination"),
    ("GunMaster0", "Gun Master"),
    ("TankSuperiority0", "Tank Superiority"),
    ("Scavenger0", "Scavenger"),
    ("CaptureTheFlag0", "Capture the Flag"),
    ("AirSuperiority0", "Air Superiority"),
];

fn lookup<'a>(table: &[(&str, &'a str)], id: &'a str) -> &'a str {
    table
        .iter()
        .find(|(key, _)| *key == id)
        .map(|(_, name)| *name)
        .unwrap_or(id)
}

/// Display name for a map identifier, or the identifier itself if unknown
pub fn map_name(id: &str) -> &str {
    lookup(MAP_NAMES, id)
}

/// Display name for a game mode identifier, or the identifier itself if unknown
pub fn game_mode_name(id: &str) -> &str {
    lookup(GAME_MODE_NAMES, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_identifiers() {
        assert_eq!(map_name("MP_001"), "Grand Bazaar");
        assert_eq!(map_name("XP1_004"), "Wake Island");
        assert_eq!(game_mode_name("ConquestSmall0"), "Conquest");
        assert_eq!(game_mode_name("RushLarge0"), "Rush");
    }

    #[test]
    fn test_unknown_identifiers_fall_back() {
        assert_eq!(map_name("MP_999"), "MP_999");
        assert_eq!(game_mode_name("Obliteration0"), "Obliteration0");
    }
}
