//! End-to-end runs of the avoidance maneuver against the simulated agent.

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rover_hal::{SimAgent, SimSensor};
use rover_runtime::behaviors::{ALIGN_DISTANCE, AVOID_DISTANCE, Avoid, AvoidMoving, AvoidState};
use rover_runtime::{Goal, GoalCore, Resume, Timing};
use rover_types::ActionToken::{Forward, Stop};
use rover_types::TurnDirection;

fn rig(seed: u64, moving: AvoidMoving) -> (Avoid, Arc<SimAgent>, Arc<SimSensor>) {
    let agent = Arc::new(SimAgent::new());
    let sensor = Arc::new(SimSensor::new(5));
    let core = GoalCore::new("avoid", agent.clone(), sensor.clone());
    let goal = Avoid::with_rng(core, Timing::default(), StdRng::seed_from_u64(seed))
        .with_moving_policy(moving);
    (goal, agent, sensor)
}

/// Update once, let the controller pick everything up, return the new state.
fn step(goal: &mut Avoid, agent: &SimAgent) -> AvoidState {
    goal.update().expect("step must succeed");
    agent.settle();
    goal.state()
}

#[test]
fn head_on_obstacle_runs_the_full_cycle() {
    for seed in 0..8 {
        let (mut goal, agent, sensor) = rig(seed, AvoidMoving::Literal);
        let mut states = vec![goal.state()];

        states.push(step(&mut goal, &agent));
        sensor.set_hits([0, 0, 1, 0, 0]);
        states.push(step(&mut goal, &agent));
        // Deciding still sees the lone head-on hit and picks a random side.
        states.push(step(&mut goal, &agent));
        sensor.clear();
        let direction = goal.turn_direction().expect("side chosen");
        assert!(TurnDirection::BOTH.contains(&direction));

        assert_eq!(
            goal.update().unwrap(),
            Resume::After(Timing::default().turn_dwell())
        );
        agent.settle();
        states.push(goal.state());

        for _ in 0..=AVOID_DISTANCE {
            states.push(step(&mut goal, &agent));
        }
        for _ in 0..=ALIGN_DISTANCE {
            states.push(step(&mut goal, &agent));
        }

        states.dedup();
        assert_eq!(
            states,
            vec![
                AvoidState::Stopped,
                AvoidState::Moving,
                AvoidState::Deciding,
                AvoidState::Turning,
                AvoidState::AvoidingObstacle,
                AvoidState::Aligning,
                AvoidState::Moving,
            ],
            "seed {seed}"
        );

        let mut expected = vec![Forward, Stop, direction.token()];
        expected.extend(std::iter::repeat_n(Forward, AVOID_DISTANCE as usize));
        expected.extend(std::iter::repeat_n(
            direction.opposite().token(),
            ALIGN_DISTANCE as usize,
        ));
        assert_eq!(agent.sent(), expected, "seed {seed}");
        // Everything was settled, so nothing is left pending.
        goal.update().unwrap();
        assert_eq!(goal.core().tracker().pending_total(), 0);
    }
}

#[test]
fn symmetric_side_hits_always_turn_right() {
    for seed in 0..16 {
        let (mut goal, agent, sensor) = rig(seed, AvoidMoving::Literal);
        step(&mut goal, &agent);
        sensor.set_hits([0, 1, 0, 1, 0]);
        step(&mut goal, &agent);
        step(&mut goal, &agent);
        assert_eq!(goal.turn_direction(), Some(TurnDirection::Right));
    }
}

#[test]
fn maneuver_resumes_after_a_dropped_send() {
    let (mut goal, agent, sensor) = rig(2, AvoidMoving::Literal);
    step(&mut goal, &agent);
    sensor.set_hits([1, 1, 0, 0, 0]);
    step(&mut goal, &agent);
    step(&mut goal, &agent);
    sensor.clear();
    step(&mut goal, &agent);
    assert_eq!(goal.state(), AvoidState::AvoidingObstacle);

    for _ in 0..3 {
        step(&mut goal, &agent);
    }
    agent.fail_next(1);
    assert!(goal.update().is_err());
    assert_eq!(goal.avoid_distance(), 3);

    while goal.state() == AvoidState::AvoidingObstacle {
        step(&mut goal, &agent);
    }
    let forwards_after_turn = agent
        .sent()
        .iter()
        .skip(3)
        .take_while(|&&t| t == Forward)
        .count();
    assert_eq!(forwards_after_turn, AVOID_DISTANCE as usize);
}

#[test]
fn exclusive_blocked_sensor_is_terminal_forever() {
    let (mut goal, agent, sensor) = rig(4, AvoidMoving::Exclusive);
    step(&mut goal, &agent);
    sensor.set_hits([1, 1, 1, 1, 1]);
    step(&mut goal, &agent);
    assert!(goal.is_terminal());
    let sent_at_end = agent.sent().len();

    for hits in [[0, 0, 0, 0, 0], [0, 0, 1, 0, 0], [1, 1, 1, 1, 1]] {
        sensor.set_hits(hits);
        assert_eq!(
            goal.update().unwrap(),
            Resume::After(Duration::from_secs(10))
        );
    }
    assert_eq!(agent.sent().len(), sent_at_end);
}
