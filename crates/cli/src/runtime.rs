//! Runtime: single-threaded event loop replaying a scenario against a session.
//!
//! Responsibilities
//! - Feed scenario steps to the loop over a channel, one event at a time.
//! - After every event, drain the session's effects: navigations are
//!   performed by a simulated browser and reported back as navigation
//!   events before the next step runs; notices go to the subscribed handler.
//! - Collect a report of what the host observed.
//!
//! A failing step is logged and recorded; the loop keeps going.

use std::collections::VecDeque;

use anyhow::Result;
use indexmap::IndexMap;
use querystate_engine::{RenderView, Session};
use querystate_types::{Effect, ItemSpec, Location, Msg, NavigationEvent, NoticeKind, SelectionChanged};
use querystate_util::SessionConfig;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::scenario::{Scenario, Step};

/// Stand-in for the host router: records every navigation it performs.
#[derive(Debug, Default)]
pub struct SimulatedBrowser {
    history: Vec<Location>,
}

impl SimulatedBrowser {
    pub fn navigate(&mut self, target: Location) -> NavigationEvent {
        debug!(target = %target, "browser navigating");
        self.history.push(target.clone());
        NavigationEvent::from_location(target)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceReport {
    pub active_key: String,
    pub location: Location,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepFailure {
    /// Zero-based step index; `None` for initial mounts
    pub step: Option<usize>,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub final_location: Location,
    pub history: Vec<Location>,
    pub notices: Vec<SelectionChanged>,
    pub renders: Vec<RenderView>,
    pub instances: IndexMap<String, InstanceReport>,
    pub failures: Vec<StepFailure>,
}

struct Runner {
    session: Session,
    browser: SimulatedBrowser,
    renders: Vec<RenderView>,
    failures: Vec<StepFailure>,
}

impl Runner {
    /// Runs one host event to completion, including the navigations it causes.
    fn cycle(&mut self, step: Option<usize>, msg: Msg) {
        let mut pending = VecDeque::from([msg]);
        while let Some(msg) = pending.pop_front() {
            let effects = match self.session.update(msg) {
                Ok(effects) => effects,
                Err(error) => {
                    warn!(step = ?step, error = %error, "scenario step failed");
                    self.failures.push(StepFailure {
                        step,
                        error: error.to_string(),
                    });
                    continue;
                }
            };
            for effect in effects {
                match effect {
                    Effect::Navigate(target) => {
                        let event = self.browser.navigate(target);
                        pending.push_back(Msg::Navigated(event));
                    }
                    Effect::Notify(notice) => {
                        self.session.dispatch_notice(&notice);
                    }
                }
            }
        }
    }

    fn render(&mut self, step: usize, id: &str, items: Option<Vec<ItemSpec>>, passthrough: Option<Value>) {
        let (current_items, current_passthrough) = match self.session.state(id) {
            Ok(state) => (state.items().to_vec(), state.passthrough().cloned()),
            Err(_) => (Vec::new(), None),
        };
        let items = items.unwrap_or(current_items);
        let passthrough = passthrough.or(current_passthrough);
        match self.session.render(id, items, passthrough) {
            Ok(view) => self.renders.push(view),
            Err(error) => {
                warn!(step, error = %error, "render failed");
                self.failures.push(StepFailure {
                    step: Some(step),
                    error: error.to_string(),
                });
            }
        }
    }

    fn step(&mut self, index: usize, step: Step, default_notify: bool) {
        let msg = match step {
            Step::Select { id, key } => Msg::Select { id, key },
            Step::Command { id, key } => Msg::Command { id, key },
            Step::Navigate(location) => Msg::Navigated(NavigationEvent::from_location(location)),
            Step::Mount(spec) => {
                let (id, options) = spec.into_options(default_notify);
                Msg::Mount { id, options }
            }
            Step::Unmount { id } => Msg::Unmount { id },
            Step::Render { id, items, passthrough } => {
                self.render(index, id.as_str(), items, passthrough);
                return;
            }
        };
        self.cycle(Some(index), msg);
    }
}

/// Replays `scenario` and returns what the host observed.
pub async fn run_scenario(scenario: Scenario, config: &SessionConfig) -> Result<RunReport> {
    let mut session = Session::with_config(config);
    if let Some(location) = scenario.location {
        session.on_navigation(&NavigationEvent::from_location(location));
    }

    let (notice_sender, mut notice_receiver) = mpsc::unbounded_channel::<SelectionChanged>();
    session.subscribe(
        NoticeKind::SelectionChanged,
        Box::new(move |notice| {
            if notice_sender.send(notice.clone()).is_err() {
                debug!("notice receiver closed; dropping notice");
            }
        }),
    );

    let mut runner = Runner {
        session,
        browser: SimulatedBrowser::default(),
        renders: Vec::new(),
        failures: Vec::new(),
    };

    for spec in scenario.instances {
        let (id, options) = spec.into_options(config.notify_on_change);
        runner.cycle(None, Msg::Mount { id, options });
    }

    let (step_sender, mut step_receiver) = mpsc::channel::<(usize, Step)>(64);
    let steps = scenario.steps;
    let producer = tokio::spawn(async move {
        for (index, step) in steps.into_iter().enumerate() {
            if step_sender.send((index, step)).await.is_err() {
                break;
            }
        }
    });

    while let Some((index, step)) = step_receiver.recv().await {
        runner.step(index, step, config.notify_on_change);
    }
    producer.await?;

    let mut notices = Vec::new();
    while let Ok(notice) = notice_receiver.try_recv() {
        notices.push(notice);
    }

    let instances = runner
        .session
        .registry()
        .iter()
        .map(|state| {
            (
                state.id().to_string(),
                InstanceReport {
                    active_key: state.active_key().to_string(),
                    location: state.current_location().clone(),
                },
            )
        })
        .collect();

    info!(
        steps_failed = runner.failures.len(),
        navigations = runner.browser.history.len(),
        notices = notices.len(),
        "scenario finished"
    );

    Ok(RunReport {
        final_location: runner.session.location().clone(),
        history: runner.browser.history,
        notices,
        renders: runner.renders,
        instances,
        failures: runner.failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_TABS: &str = r#"
location: "/profile"
instances:
  - id: tabs_1
    notifyOnChange: true
    initialItems:
      - { key: name, label: Name, content: name_panel }
      - { key: address, label: Address, content: address_panel }
  - id: tabs_2
    initialItems:
      - { key: name, label: Name, content: name_panel }
      - { key: address, label: Address, content: address_panel }
steps:
  - select: { id: tabs_1, key: address }
  - select: { id: tabs_1, key: billing }
  - command: { id: tabs_2, key: address }
  - navigate: "/profile?tabs_1=name&tabs_2=address"
  - render: { id: tabs_2, passthrough: { parent: tabs_1 } }
  - unmount: { id: tabs_1 }
  - select: { id: tabs_1, key: name }
"#;

    fn scenario() -> Scenario {
        Scenario::from_str_with_format(TWO_TABS, false).expect("parse")
    }

    #[tokio::test]
    async fn replays_two_instance_scenario() {
        let report = run_scenario(scenario(), &SessionConfig::default()).await.expect("run");

        let history: Vec<_> = report.history.iter().map(ToString::to_string).collect();
        assert_eq!(history, vec!["/profile?tabs_1=address", "/profile?tabs_1=address&tabs_2=address"]);

        assert_eq!(report.notices.len(), 1);
        assert_eq!(report.notices[0].active_key.as_str(), "address");

        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].step, Some(1));
        assert_eq!(report.failures[1].step, Some(6));

        assert_eq!(report.renders.len(), 1);
        assert_eq!(report.renders[0].passthrough, Some(serde_json::json!({"parent": "tabs_1"})));
        assert_eq!(report.renders[0].active_key.as_str(), "address");

        assert_eq!(report.instances.len(), 1);
        assert_eq!(report.instances["tabs_2"].active_key, "address");
        assert_eq!(report.final_location.to_string(), "/profile?tabs_1=name&tabs_2=address");
    }

    #[tokio::test]
    async fn config_default_controls_notices() {
        let config = SessionConfig {
            notify_on_change: true,
            ..SessionConfig::default()
        };
        let report = run_scenario(scenario(), &config).await.expect("run");
        // tabs_2 now opts in too, but only user selections notify and tabs_2
        // only ever changes through a host command.
        assert_eq!(report.notices.len(), 1);
    }

    #[tokio::test]
    async fn replays_bundled_demo() {
        let content = include_str!("../../../demos/two_tabs.yaml");
        let scenario = Scenario::from_str_with_format(content, false).expect("parse demo");
        let report = run_scenario(scenario, &SessionConfig::default()).await.expect("run");

        let history: Vec<_> = report.history.iter().map(ToString::to_string).collect();
        assert_eq!(
            history,
            vec!["/profile?lang=en&tabs_1=address", "/profile?lang=en&tabs_1=address&tabs_2=address"]
        );
        assert_eq!(report.notices.len(), 1);
        assert_eq!(report.renders[0].passthrough, Some(serde_json::json!({"user_id": 42})));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].step, Some(4));
        assert_eq!(report.instances.keys().collect::<Vec<_>>(), vec!["tabs_2"]);
        assert_eq!(report.final_location.to_string(), "/profile?lang=en&tabs_1=name&tabs_2=address");
    }

    #[test]
    fn browser_records_history() {
        let mut browser = SimulatedBrowser::default();
        let event = browser.navigate(Location::parse("/?a=1").expect("parse"));
        assert_eq!(event.params.get("a").map(String::as_str), Some("1"));
        assert_eq!(browser.history.len(), 1);
    }
}
