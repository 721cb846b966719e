//! Query lifecycle for one forecast view.
//!
//! [`ForecastController`] owns the observable [`ForecastState`] and publishes
//! it over a `tokio::sync::watch` channel. Every transition is applied with a
//! single `send_modify`, so a subscriber never sees the loading flag, error
//! and records out of step with each other.

use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::{
    model::ForecastRecord,
    parser,
    provider::{FetchError, ForecastProvider},
};

/// Shown when nothing has been queried yet or a query produced no records.
pub const EMPTY_PROMPT: &str = "Enter a city or county name to look up its forecast.";

/// Snapshot of everything a view needs to render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForecastState {
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub records: Vec<ForecastRecord>,
}

/// The four mutually exclusive ways a [`ForecastState`] can be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus<'a> {
    Loading,
    Error(&'a str),
    Empty,
    Results(&'a [ForecastRecord]),
}

impl ForecastState {
    /// Loading beats error, error beats records.
    pub fn status(&self) -> ViewStatus<'_> {
        if self.is_loading {
            ViewStatus::Loading
        } else if let Some(message) = self.error_message.as_deref() {
            ViewStatus::Error(message)
        } else if self.records.is_empty() {
            ViewStatus::Empty
        } else {
            ViewStatus::Results(&self.records)
        }
    }
}

fn not_found_message(location_name: &str) -> String {
    format!("No weather data found for \"{location_name}\".\nEnter any city or county in Taiwan.")
}

fn load_failed_message(err: &FetchError) -> String {
    format!("Failed to load weather data: {err}")
}

#[derive(Debug)]
pub struct ForecastController<P> {
    provider: P,
    state: watch::Sender<ForecastState>,
}

impl<P: ForecastProvider> ForecastController<P> {
    pub fn new(provider: P) -> Self {
        let (state, _) = watch::channel(ForecastState::default());
        Self { provider, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<ForecastState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ForecastState {
        self.state.borrow().clone()
    }

    /// Fetch and publish the forecast for `location_name`.
    ///
    /// The name is forwarded as-is. Overlapping calls are not serialized:
    /// whichever resolves last determines the published records.
    #[instrument(skip(self))]
    pub async fn submit_query(&self, location_name: &str) {
        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error_message = None;
        });
        let loading = LoadingGuard { state: &self.state, armed: true };

        let outcome = self.provider.fetch_weather_by_location(location_name).await;

        let (records, error_message) = match outcome {
            Ok(response) if response.records.location.is_empty() => {
                info!("no locations matched");
                (Vec::new(), Some(not_found_message(location_name)))
            }
            Ok(response) => {
                let records = parser::parse(&response);
                info!(records = records.len(), "forecast loaded");
                (records, None)
            }
            Err(err) => {
                warn!(error = %err, "forecast fetch failed");
                (Vec::new(), Some(load_failed_message(&err)))
            }
        };

        loading.complete(|state| {
            state.records = records;
            state.error_message = error_message;
        });
    }
}

/// Clears the loading flag when a query ends without reaching
/// [`LoadingGuard::complete`], e.g. the future was dropped or the provider
/// panicked.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<ForecastState>,
    armed: bool,
}

impl LoadingGuard<'_> {
    fn complete(mut self, apply: impl FnOnce(&mut ForecastState)) {
        self.armed = false;
        self.state.send_modify(|state| {
            apply(state);
            state.is_loading = false;
        });
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.send_modify(|state| state.is_loading = false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ApiResult, ElementSeries, LocationForecast, ParameterValue, Records, TimeSlot,
        WeatherResponse,
    };
    use async_trait::async_trait;
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    #[derive(Debug)]
    enum Behavior {
        Respond(WeatherResponse),
        EmptyBody,
        Panic,
        Hang,
        /// Respond with one location named after the query, after a delay
        /// taken from the query's numeric suffix in milliseconds.
        EchoAfterDelay,
    }

    #[derive(Debug)]
    struct StubProvider {
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn new(behavior: Behavior) -> Self {
            Self { behavior, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl ForecastProvider for StubProvider {
        async fn fetch_weather_by_location(
            &self,
            location_name: &str,
        ) -> Result<WeatherResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Respond(response) => Ok(response.clone()),
                Behavior::EmptyBody => Err(FetchError::EmptyBody),
                Behavior::Panic => panic!("provider defect"),
                Behavior::Hang => std::future::pending::<Result<WeatherResponse, FetchError>>().await,
                Behavior::EchoAfterDelay => {
                    let millis = location_name
                        .rsplit('-')
                        .next()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0);
                    tokio::time::sleep(Duration::from_millis(millis)).await;
                    Ok(response_with(vec![location(location_name, &["Clear"])]))
                }
            }
        }
    }

    fn location(name: &str, weather: &[&str]) -> LocationForecast {
        let slot = |value: &&str| TimeSlot {
            start_time: "2025-10-02 18:00:00".into(),
            end_time: "2025-10-03 06:00:00".into(),
            parameter: ParameterValue {
                parameter_name: value.to_string(),
                parameter_value: None,
                parameter_unit: None,
            },
        };
        LocationForecast {
            location_name: name.into(),
            weather_element: vec![ElementSeries {
                element_name: "Wx".into(),
                time: weather.iter().map(slot).collect(),
            }],
        }
    }

    fn response_with(locations: Vec<LocationForecast>) -> WeatherResponse {
        WeatherResponse {
            success: "true".into(),
            result: ApiResult { resource_id: "F-C0032-001".into(), fields: Vec::new() },
            records: Records { dataset_description: "test".into(), location: locations },
        }
    }

    fn record(location_name: &str) -> ForecastRecord {
        ForecastRecord {
            start_time: String::new(),
            end_time: String::new(),
            weather_description: "Sunny".into(),
            temperature_range: "-°C".into(),
            rain_probability: "%".into(),
            location_name: location_name.into(),
        }
    }

    #[test]
    fn status_is_mutually_exclusive_with_precedence() {
        let mut state = ForecastState::default();
        assert_eq!(state.status(), ViewStatus::Empty);

        state.records = vec![record("Taipei")];
        assert!(matches!(state.status(), ViewStatus::Results(r) if r.len() == 1));

        state.error_message = Some("boom".into());
        assert_eq!(state.status(), ViewStatus::Error("boom"));

        state.is_loading = true;
        assert_eq!(state.status(), ViewStatus::Loading);
    }

    #[tokio::test]
    async fn starts_idle() {
        let controller = ForecastController::new(StubProvider::new(Behavior::EmptyBody));
        assert_eq!(controller.snapshot(), ForecastState::default());
        assert_eq!(controller.snapshot().status(), ViewStatus::Empty);
    }

    #[tokio::test]
    async fn success_publishes_parsed_records() {
        let stub = StubProvider::new(Behavior::Respond(response_with(vec![
            location("Taipei", &["Cloudy", "Rainy"]),
            location("Keelung", &["Windy"]),
        ])));
        let controller = ForecastController::new(stub);

        controller.submit_query("Taipei").await;

        let state = controller.snapshot();
        assert!(!state.is_loading);
        assert_eq!(state.error_message, None);
        let names: Vec<&str> = state.records.iter().map(|r| r.location_name.as_str()).collect();
        assert_eq!(names, ["Taipei", "Taipei", "Keelung"]);
        assert_eq!(controller.provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_location_list_is_not_found() {
        let controller =
            ForecastController::new(StubProvider::new(Behavior::Respond(response_with(Vec::new()))));
        controller.state.send_modify(|s| s.records = vec![record("Old")]);

        controller.submit_query("Atlantis").await;

        let state = controller.snapshot();
        assert!(!state.is_loading);
        assert!(state.records.is_empty());
        let message = state.error_message.expect("not-found message");
        assert!(message.contains("\"Atlantis\""));
        assert!(message.starts_with("No weather data found"));
    }

    #[tokio::test]
    async fn failure_sets_error_and_clears_records() {
        let controller = ForecastController::new(StubProvider::new(Behavior::EmptyBody));
        controller.state.send_modify(|s| s.records = vec![record("Old")]);

        controller.submit_query("Taipei").await;

        let state = controller.snapshot();
        assert!(!state.is_loading);
        assert!(state.records.is_empty());
        assert_eq!(
            state.error_message.as_deref(),
            Some("Failed to load weather data: response body was empty")
        );
    }

    #[tokio::test]
    async fn new_query_clears_error_but_keeps_records_while_loading() {
        let controller = ForecastController::new(StubProvider::new(Behavior::Hang));
        controller.state.send_modify(|s| {
            s.records = vec![record("Old")];
            s.error_message = Some("previous".into());
        });
        let mut rx = controller.subscribe();

        let pending = controller.submit_query("Taipei");
        tokio::pin!(pending);
        tokio::select! {
            _ = &mut pending => unreachable!("hanging provider never resolves"),
            changed = rx.changed() => changed.expect("sender alive"),
        }

        let state = rx.borrow_and_update().clone();
        assert!(state.is_loading);
        assert_eq!(state.error_message, None);
        assert_eq!(state.records, vec![record("Old")]);
    }

    #[tokio::test]
    async fn blank_query_still_hits_provider() {
        let controller =
            ForecastController::new(StubProvider::new(Behavior::Respond(response_with(Vec::new()))));

        controller.submit_query("   ").await;

        assert_eq!(controller.provider.calls.load(Ordering::SeqCst), 1);
        assert!(controller.snapshot().error_message.is_some());
    }

    #[tokio::test]
    async fn cancelled_query_releases_loading() {
        let controller = ForecastController::new(StubProvider::new(Behavior::Hang));

        let result =
            tokio::time::timeout(Duration::from_millis(20), controller.submit_query("Taipei")).await;
        assert!(result.is_err());

        assert!(!controller.snapshot().is_loading);
    }

    #[tokio::test]
    async fn panicking_provider_releases_loading() {
        let controller = Arc::new(ForecastController::new(StubProvider::new(Behavior::Panic)));

        let task = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.submit_query("Taipei").await })
        };
        assert!(task.await.unwrap_err().is_panic());

        assert!(!controller.snapshot().is_loading);
    }

    #[tokio::test]
    async fn last_resolved_query_wins() {
        let controller = ForecastController::new(StubProvider::new(Behavior::EchoAfterDelay));

        tokio::join!(controller.submit_query("slow-80"), controller.submit_query("fast-0"));

        let state = controller.snapshot();
        assert!(!state.is_loading);
        assert_eq!(state.records.len(), 1);
        assert_eq!(state.records[0].location_name, "slow-80");
    }

    #[tokio::test]
    async fn subscribers_see_loading_then_result() {
        let stub = StubProvider::new(Behavior::Respond(response_with(vec![location(
            "Taipei",
            &["Cloudy"],
        )])));
        let controller = Arc::new(ForecastController::new(stub));
        let mut rx = controller.subscribe();

        let observer = tokio::spawn(async move {
            let mut seen = Vec::new();
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                let done = !state.is_loading;
                seen.push(state);
                if done {
                    break;
                }
            }
            seen
        });

        controller.submit_query("Taipei").await;
        let seen = observer.await.expect("observer task");

        let last = seen.last().expect("at least one update");
        assert!(!last.is_loading);
        assert_eq!(last.records.len(), 1);
        for state in &seen {
            if state.is_loading {
                assert_eq!(state.error_message, None);
            }
        }
    }
}
