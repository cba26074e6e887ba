//! End-to-end lifecycle tests against a scripted engine.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use swarmctl_engine_api::{
    AnnounceOptions, LifecycleEvent, ObservationKind, PeerAddr, SocketFamily, Topic,
};
use swarmctl_engine_sim::ScriptedEngine;
use swarmctl_node_core::{Agent, EventRenderer, OutputMode};
use tokio::sync::mpsc;

/// Writer the agent can own while the test keeps reading it.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn lines(&self) -> Vec<String> {
        let buf = self.0.lock().unwrap();
        String::from_utf8(buf.clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for SharedBuf {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn agent_for(
    engine: &Arc<ScriptedEngine>,
    mode: OutputMode,
    verbose: bool,
) -> (Agent<SharedBuf>, SharedBuf) {
    let out = SharedBuf::default();
    let renderer = EventRenderer::new(mode, verbose, out.clone());
    (Agent::new(engine.clone(), renderer), out)
}

fn trigger() -> mpsc::UnboundedReceiver<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(()).unwrap();
    // Keeping no sender around closes the channel after the one trigger,
    // which the run loop tolerates.
    rx
}

fn listening() -> LifecycleEvent {
    LifecycleEvent::Listening {
        address: "0.0.0.0".into(),
        port: 49737,
        family: SocketFamily::V4,
    }
}

#[tokio::test]
async fn clean_run_renders_events_in_order_and_exits_zero() {
    let engine = Arc::new(ScriptedEngine::with_script([
        listening(),
        LifecycleEvent::Bootstrapped,
        LifecycleEvent::Warning {
            message: "slow bootstrap".into(),
        },
    ]));
    let (agent, out) = agent_for(&engine, OutputMode::Text, false);

    let code = agent.run(trigger()).await.unwrap();
    assert_eq!(code, 0);
    assert_eq!(engine.calls().destroys, 1);

    let lines = out.lines();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("Listening on 0.0.0.0:49737"));
    assert_eq!(lines[1], "Node fully bootstrapped");
    assert_eq!(lines[2], "Warning: slow bootstrap");
    assert_eq!(lines[3], "Engine closed");
}

#[tokio::test]
async fn structured_mode_emits_one_json_record_per_event() {
    let engine = Arc::new(ScriptedEngine::with_script([
        listening(),
        LifecycleEvent::Bootstrapped,
    ]));
    let (agent, out) = agent_for(&engine, OutputMode::Json, false);

    let code = agent.run(trigger()).await.unwrap();
    assert_eq!(code, 0);

    let kinds: Vec<String> = out
        .lines()
        .iter()
        .map(|line| {
            serde_json::from_str::<serde_json::Value>(line).unwrap()["kind"]
                .as_str()
                .unwrap()
                .to_string()
        })
        .collect();
    assert_eq!(kinds, ["listening", "bootstrapped", "closed"]);
}

#[tokio::test]
async fn repeated_triggers_run_the_shutdown_sequence_once() {
    let engine = Arc::new(ScriptedEngine::new());
    let (mut agent, _) = agent_for(&engine, OutputMode::Text, false);

    let topic = Topic::from([5u8; 32]);
    agent
        .sessions()
        .open_announce(topic, AnnounceOptions::default())
        .await
        .unwrap();

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(()).unwrap();
    tx.send(()).unwrap();
    tx.send(()).unwrap();

    let code = agent.run(rx).await.unwrap();
    assert_eq!(code, 0);

    let calls = engine.calls();
    assert_eq!(calls.destroys, 1);
    assert_eq!(calls.unannounces, 1);
    assert_eq!(engine.unannounced(), vec![topic]);
}

#[tokio::test]
async fn fatal_error_sets_exit_code_one_and_shuts_down() {
    let engine = Arc::new(ScriptedEngine::with_script([
        LifecycleEvent::Bootstrapped,
        LifecycleEvent::FatalError {
            message: "routing table corrupt".into(),
        },
    ]));
    let (agent, out) = agent_for(&engine, OutputMode::Text, false);

    // No external trigger: the fatal event itself drives the shutdown.
    let (_tx, rx) = mpsc::unbounded_channel();
    let code = agent.run(rx).await.unwrap();
    assert_eq!(code, 1);
    assert_eq!(engine.calls().destroys, 1);

    let lines = out.lines();
    assert_eq!(lines[1], "Error: routing table corrupt");
    assert_eq!(lines[2], "Engine closed");
}

#[tokio::test]
async fn run_does_not_return_before_closure_is_confirmed() {
    let engine = Arc::new(ScriptedEngine::new().without_close_on_destroy());
    let (agent, _) = agent_for(&engine, OutputMode::Text, false);

    let handle = tokio::spawn(agent.run(trigger()));

    // Destroy has been requested but never confirmed; the run must still be
    // waiting on the event stream.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(engine.calls().destroys, 1);
    assert!(!handle.is_finished());

    engine.emit(LifecycleEvent::EngineClosed);
    let code = handle.await.unwrap().unwrap();
    assert_eq!(code, 0);
}

#[tokio::test]
async fn verbosity_filter_applies_end_to_end() {
    let script = [
        LifecycleEvent::PeerObserved {
            kind: ObservationKind::Announce,
            topic: Topic::from([9u8; 32]),
            peer: PeerAddr {
                host: "203.0.113.9".into(),
                port: 4000,
            },
        },
        LifecycleEvent::ConnectionOpened {
            id: 0,
            initiator: false,
        },
        LifecycleEvent::ConnectionClosed { id: 0, error: None },
        LifecycleEvent::Bootstrapped,
    ];

    let engine = Arc::new(ScriptedEngine::with_script(script.clone()));
    let (agent, out) = agent_for(&engine, OutputMode::Text, false);
    agent.run(trigger()).await.unwrap();
    assert_eq!(out.lines(), vec!["Node fully bootstrapped", "Engine closed"]);

    let engine = Arc::new(ScriptedEngine::with_script(script));
    let (agent, out) = agent_for(&engine, OutputMode::Text, true);
    agent.run(trigger()).await.unwrap();
    assert_eq!(out.lines().len(), 5);
}

#[tokio::test]
async fn reachability_report_follows_bootstrap() {
    let engine = Arc::new(
        ScriptedEngine::with_script([LifecycleEvent::Bootstrapped]).with_remote_address(
            PeerAddr {
                host: "203.0.113.7".into(),
                port: 49737,
            },
        ),
    );
    let (agent, out) = agent_for(&engine, OutputMode::Text, false);
    let agent = agent.with_reachability_report();

    let code = agent.run(trigger()).await.unwrap();
    assert_eq!(code, 0);

    let lines = out.lines();
    assert_eq!(lines[0], "Node fully bootstrapped");
    assert_eq!(
        lines[1],
        "Network appears holepunchable (remote address is 203.0.113.7:49737)"
    );
    assert_eq!(lines[2], "Engine closed");
}

#[tokio::test]
async fn non_holepunchable_network_warns_after_bootstrap() {
    let engine =
        Arc::new(ScriptedEngine::with_script([LifecycleEvent::Bootstrapped]).not_holepunchable());
    let (agent, out) = agent_for(&engine, OutputMode::Text, false);
    let agent = agent.with_reachability_report();

    agent.run(trigger()).await.unwrap();
    assert_eq!(
        out.lines()[1],
        "Warning: network does not appear holepunchable"
    );
}

#[tokio::test]
async fn finish_tears_down_one_shot_runs() {
    let engine = Arc::new(ScriptedEngine::new());
    let (agent, out) = agent_for(&engine, OutputMode::Text, false);

    let code = agent.finish().await.unwrap();
    assert_eq!(code, 0);
    assert_eq!(engine.calls().destroys, 1);
    assert_eq!(out.lines(), vec!["Engine closed"]);
}

#[tokio::test]
async fn sessions_opened_after_shutdown_are_released() {
    let engine = Arc::new(ScriptedEngine::new());
    let (mut agent, _) = agent_for(&engine, OutputMode::Text, false);

    agent.sessions().close_all().await;
    let topic = Topic::from([8u8; 32]);
    agent
        .sessions()
        .open_announce(topic, AnnounceOptions::default())
        .await
        .unwrap();

    // The late announce was immediately withdrawn.
    assert_eq!(agent.sessions().open_count(), 0);
    assert_eq!(engine.unannounced(), vec![topic]);
}
