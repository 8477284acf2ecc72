use fireteam_game::{
    CombatResolver, MissionCatalog, MissionId, Opening, PlayerState, RngBundle, RoleId,
    constants::HEADSHOT_PCT,
};

const SAMPLE_SIZE: usize = 5000;
const TOLERANCE: f64 = 0.025;

fn rate(hits: usize) -> f64 {
    f64::from(u32::try_from(hits).expect("count fits"))
        / f64::from(u32::try_from(SAMPLE_SIZE).expect("sample size fits"))
}

#[test]
fn headshot_rate_tracks_fixed_probability() {
    let mut bundle = RngBundle::from_user_seed(0xF1E1D);
    let expected = f64::from(HEADSHOT_PCT) / 100.0;
    for mission in MissionCatalog::list_missions() {
        let mut headshots = 0usize;
        for _ in 0..SAMPLE_SIZE {
            let mut player = PlayerState::new(RoleId::Sniper);
            let encounter = CombatResolver::open(&mut player, mission, bundle.combat()).unwrap();
            if encounter.opening == Opening::Headshot {
                headshots += 1;
                assert_eq!(player.hp, 0);
            }
        }
        let observed = rate(headshots);
        assert!(
            (observed - expected).abs() <= TOLERANCE,
            "{} headshot rate drifted: observed {observed:.4}",
            mission.name
        );
    }
}

#[test]
fn engineer_disarm_rate_tracks_seventy_percent() {
    let mut bundle = RngBundle::from_user_seed(0xD15A);
    let pass = MissionCatalog::mission(MissionId::MountainPass);
    let mut disarmed = 0usize;
    let mut headshots = 0usize;
    for _ in 0..SAMPLE_SIZE {
        let mut player = PlayerState::new(RoleId::Engineer);
        match CombatResolver::open(&mut player, pass, bundle.combat())
            .unwrap()
            .opening
        {
            Opening::Disarmed => disarmed += 1,
            Opening::Headshot => headshots += 1,
            Opening::Contact => {}
        }
    }
    assert!((rate(disarmed) - 0.70).abs() <= TOLERANCE);
    // Headshots only happen on the 30% of approaches that were not disarmed.
    assert!((rate(headshots) - 0.03).abs() <= TOLERANCE);
}

#[test]
fn loot_drop_rates_match_tables() {
    let mut bundle = RngBundle::from_user_seed(0x1007);
    let base = MissionCatalog::mission(MissionId::AbandonedBase);
    let table = MissionCatalog::loot_table_for(base);
    let mut player = PlayerState::new(RoleId::Soldier);
    for _ in 0..SAMPLE_SIZE {
        fireteam_game::InventoryLedger::grant_loot(&mut player, table, bundle.loot());
    }
    for entry in table {
        let held = usize::try_from(player.inventory.count(entry.item)).expect("count fits");
        let expected = f64::from(entry.pct) / 100.0;
        assert!(
            (rate(held) - expected).abs() <= TOLERANCE,
            "{} drop rate drifted",
            entry.item
        );
    }
}
