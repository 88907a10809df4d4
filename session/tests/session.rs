use std::{
    cell::RefCell,
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    rc::Rc,
    time::Duration,
};

use glam::Vec2;
use tower_siege_core::{
    ActionError, Difficulty, EnemyKind, Event, GameConfig, TowerKind, UpgradeRequest, WaveGroup,
};
use tower_siege_session::{Phase, Session, SessionSettings};
use tower_siege_world::query;

type Log = Rc<RefCell<Vec<Event>>>;

fn session_with(config: GameConfig, seed: u64) -> (Session, Log) {
    let settings = SessionSettings::from_config(&config, Difficulty::Normal, seed);
    let mut session = Session::new(config, settings).expect("valid configuration");
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let _ = session.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    (session, log)
}

fn session() -> (Session, Log) {
    session_with(GameConfig::default(), 17)
}

fn kill_everything(session: &mut Session) {
    let live: Vec<_> = query::enemy_view(session.world())
        .iter()
        .map(|enemy| enemy.id)
        .collect();
    for enemy in live {
        session.on_enemy_died(enemy).expect("live enemy");
    }
}

fn contains(log: &Log, event: &Event) -> bool {
    log.borrow().contains(event)
}

#[test]
fn first_wave_starts_after_the_countdown() {
    let (mut session, log) = session();
    assert_eq!(session.phase(), Phase::Countdown { next_wave: 1 });

    session.on_tick(Duration::from_millis(2_999));
    assert!(!log
        .borrow()
        .iter()
        .any(|event| matches!(event, Event::WaveStarted { .. })));

    session.on_tick(Duration::from_millis(1));
    assert!(contains(
        &log,
        &Event::WaveStarted {
            wave: 1,
            composition: vec![WaveGroup::new(EnemyKind::Basic, 10)],
        }
    ));
    assert_eq!(session.phase(), Phase::Wave { number: 1 });
    assert_eq!(query::live_enemies(session.world()), 1);
}

#[test]
fn skipping_during_a_wave_is_rejected() {
    let (mut session, log) = session();
    assert_eq!(session.skip_to_next_wave(), Ok(1));
    assert_eq!(
        session.skip_to_next_wave(),
        Err(ActionError::WaveInProgress(1))
    );
    assert!(contains(
        &log,
        &Event::ActionRejected {
            error: ActionError::WaveInProgress(1)
        }
    ));
}

#[test]
fn cleared_wave_pays_bonus_then_interest_on_the_next() {
    let (mut session, log) = session();
    let _ = session.skip_to_next_wave().expect("wave 1");

    let mut ticks = 0;
    while !contains(
        &log,
        &Event::WaveStarted {
            wave: 2,
            composition: vec![WaveGroup::new(EnemyKind::Basic, 12)],
        },
    ) {
        session.on_tick(Duration::from_millis(100));
        kill_everything(&mut session);
        ticks += 1;
        assert!(ticks < 200, "wave 2 never started");
    }

    assert!(contains(&log, &Event::WaveCompleted { wave: 1 }));
    assert!(contains(&log, &Event::GoldChanged { new: 625, old: 600 }));
    assert!(contains(&log, &Event::InterestEarned { amount: 62 }));
    assert_eq!(query::ledger(session.world()).wave(), 2);
}

#[test]
fn completing_the_last_wave_wins() {
    let mut config = GameConfig::default();
    config.waves.max_waves = 1;
    let (mut session, log) = session_with(config, 3);
    let _ = session.skip_to_next_wave().expect("wave 1");

    for _ in 0..100 {
        session.on_tick(Duration::from_millis(100));
        kill_everything(&mut session);
    }

    assert_eq!(session.phase(), Phase::Victory);
    let victories = log
        .borrow()
        .iter()
        .filter(|event| **event == Event::AllWavesCompleted)
        .count();
    assert_eq!(victories, 1);

    let before = log.borrow().len();
    session.on_tick(Duration::from_secs(1));
    assert_eq!(log.borrow().len(), before, "finished sessions stay silent");
}

#[test]
fn running_out_of_lives_halts_the_session() {
    let mut config = GameConfig::default();
    if let Some(normal) = config.difficulty.get_mut(&Difficulty::Normal) {
        normal.starting_lives = 1;
    }
    let (mut session, log) = session_with(config, 5);
    let _ = session.skip_to_next_wave().expect("wave 1");

    for _ in 0..400 {
        session.on_tick(Duration::from_millis(100));
    }

    assert_eq!(session.phase(), Phase::GameOver);
    let game_overs = log
        .borrow()
        .iter()
        .filter(|event| matches!(event, Event::GameOver { .. }))
        .count();
    assert_eq!(game_overs, 1);
    assert_eq!(
        session.on_placement_requested(TowerKind::Arrow, Vec2::new(400.0, 300.0)),
        Err(ActionError::GameOver)
    );
    assert_eq!(session.skip_to_next_wave(), Err(ActionError::GameOver));

    session.restart();
    assert_eq!(session.phase(), Phase::Countdown { next_wave: 1 });
    assert_eq!(query::ledger(session.world()).lives(), 1);
    assert_eq!(query::live_enemies(session.world()), 0);
    assert!(session
        .on_placement_requested(TowerKind::Arrow, Vec2::new(400.0, 300.0))
        .is_ok());
}

#[test]
fn tier_up_at_the_cap_is_rejected_without_charge() {
    let mut config = GameConfig::default();
    config.economy.tier_cost_factor = 0.0;
    let (mut session, _log) = session_with(config, 17);
    let tower = session
        .on_placement_requested(TowerKind::Arrow, Vec2::new(400.0, 300.0))
        .expect("placement");
    for _ in 1..5 {
        session
            .on_upgrade_requested(tower, UpgradeRequest::Tier)
            .expect("free tier-up");
    }
    let gold = query::ledger(session.world()).gold();
    assert_eq!(
        session.on_upgrade_requested(tower, UpgradeRequest::Tier),
        Err(ActionError::MaxTierReached)
    );
    assert_eq!(query::ledger(session.world()).gold(), gold);
    let details = query::tower(session.world(), tower).expect("tower");
    assert_eq!(details.tier.get(), 5);
}

#[test]
fn unsubscribed_listeners_miss_later_events() {
    let (mut session, log) = session();
    let extra = Rc::new(RefCell::new(0usize));
    let counter = Rc::clone(&extra);
    let id = session.subscribe(move |_| *counter.borrow_mut() += 1);

    session.on_tick(Duration::from_millis(10));
    let seen = *extra.borrow();
    assert!(seen > 0);
    assert!(session.unsubscribe(id));

    session.on_tick(Duration::from_millis(10));
    assert_eq!(*extra.borrow(), seen);
    assert!(log.borrow().len() > seen, "other listeners keep receiving");
}

#[test]
fn deterministic_replay_produces_identical_event_log() {
    let first = replay(0xfeed);
    let second = replay(0xfeed);
    assert_eq!(first.0, second.0, "replay diverged between runs");
    assert!(first.1 > 0, "the scripted defence must kill something");
}

fn replay(seed: u64) -> (u64, usize) {
    let (mut session, log) = session_with(GameConfig::default(), seed);
    for spot in [Vec2::new(128.0, 420.0), Vec2::new(300.0, 300.0)] {
        let _ = session
            .on_placement_requested(TowerKind::Arrow, spot)
            .expect("placement");
    }
    let _ = session
        .on_placement_requested(TowerKind::Cannon, Vec2::new(200.0, 250.0))
        .expect("placement");

    for _ in 0..1_200 {
        session.on_tick(Duration::from_millis(50));
    }

    let log = log.borrow();
    let mut hasher = DefaultHasher::new();
    for event in log.iter() {
        format!("{event:?}").hash(&mut hasher);
    }
    let kills = log
        .iter()
        .filter(|event| matches!(event, Event::EnemyDied { .. }))
        .count();
    (hasher.finish(), kills)
}

#[test]
fn placement_returns_the_world_outcome() {
    let (mut session, log) = session();
    assert_eq!(
        session.on_placement_requested(TowerKind::Arrow, Vec2::new(100.0, 390.0)),
        Err(ActionError::OnPath)
    );
    assert!(matches!(
        log.borrow().last(),
        Some(Event::ActionRejected {
            error: ActionError::OnPath
        })
    ));

    let tower = session
        .on_placement_requested(TowerKind::Arrow, Vec2::new(400.0, 300.0))
        .expect("placement");
    let placed = log.borrow().iter().find_map(|event| match event {
        Event::TowerPlaced { tower, .. } => Some(*tower),
        _ => None,
    });
    assert_eq!(placed, Some(tower));
}
