use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use munchies_core::{MunchieEnvelope, MunchieError, MunchieRequest};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/munchies", get(munchies))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct MunchieParams {
    pub start: Option<String>,
    pub end: Option<String>,
    pub food: Option<String>,
}

/// `{ "errors": [ ... ] }` body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub errors: Vec<ApiError>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub status: String,
    pub title: &'static str,
    pub detail: String,
}

fn error_response(status: StatusCode, title: &'static str, detail: String) -> Response {
    let body = ErrorBody {
        errors: vec![ApiError { status: status.as_u16().to_string(), title, detail }],
    };
    (status, Json(body)).into_response()
}

fn munchie_error_response(err: &MunchieError) -> Response {
    let (status, title) = match err {
        MunchieError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "Invalid input"),
        MunchieError::NoResultFound { .. } => (StatusCode::NOT_FOUND, "No result found"),
        MunchieError::UpstreamUnavailable { .. } => (StatusCode::BAD_GATEWAY, "Upstream unavailable"),
    };
    error_response(status, title, err.to_string())
}

pub async fn munchies(
    State(state): State<AppState>,
    params: Result<Query<MunchieParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, "Invalid input", rejection.body_text());
        }
    };

    let request = match MunchieRequest::try_new(params.start, params.end, params.food) {
        Ok(r) => r,
        Err(err) => return munchie_error_response(&err),
    };

    match tokio::time::timeout(state.request_timeout, state.aggregator.handle(&request)).await {
        Ok(Ok(response)) => Json(MunchieEnvelope::from(response)).into_response(),
        Ok(Err(err)) => {
            warn!(
                error = %err,
                provider = ?err.provider(),
                start = %request.start,
                end = %request.end,
                "munchies request failed"
            );
            munchie_error_response(&err)
        }
        Err(_) => {
            warn!(timeout = ?state.request_timeout, "munchies request timed out");
            error_response(
                StatusCode::GATEWAY_TIMEOUT,
                "Upstream timeout",
                format!("providers did not answer within {:?}", state.request_timeout),
            )
        }
    }
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod munchies_http_tests {
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use munchies_core::{
        ArrivalTime, ForecastProvider, MunchieAggregator, MunchieError, ProviderId,
        RestaurantFinder, RestaurantInfo, TravelTime, TravelTimeProvider,
    };
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    use super::router;
    use crate::state::AppState;

    #[derive(Debug, Default)]
    struct FixedTravel {
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl TravelTimeProvider for FixedTravel {
        async fn travel_time(&self, _start: &str, _end: &str) -> Result<TravelTime, MunchieError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(TravelTime { text: "1 hour 48 mins".into(), value: 6455 })
        }
    }

    #[derive(Debug)]
    struct FixedRestaurants {
        open: bool,
    }

    #[async_trait]
    impl RestaurantFinder for FixedRestaurants {
        async fn find_open(
            &self,
            _location: &str,
            _cuisine: &str,
            _open_at: ArrivalTime,
        ) -> Result<RestaurantInfo, MunchieError> {
            if !self.open {
                return Err(MunchieError::no_result(ProviderId::Yelp, "nothing open"));
            }
            Ok(RestaurantInfo {
                name: "Golden Dragon".into(),
                address: "4602 N. Elizabeth St, Pueblo, CO 81008".into(),
            })
        }
    }

    #[derive(Debug)]
    struct FixedForecast {
        up: bool,
    }

    #[async_trait]
    impl ForecastProvider for FixedForecast {
        async fn forecast_at(&self, _location: &str, _at: ArrivalTime) -> Result<String, MunchieError> {
            if !self.up {
                return Err(MunchieError::unavailable(ProviderId::OpenWeather, "status 503"));
            }
            Ok("light rain".into())
        }
    }

    fn make_state(travel: Arc<FixedTravel>, open: bool, up: bool) -> AppState {
        let aggregator = MunchieAggregator::new(
            travel,
            Arc::new(FixedRestaurants { open }),
            Arc::new(FixedForecast { up }),
        );
        AppState::new(aggregator, Duration::from_secs(5))
    }

    async fn get_json(state: AppState, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router(state)
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn it_should_return_200_with_munchie_envelope() {
        let state = make_state(Arc::new(FixedTravel::default()), true, true);

        let (status, json) =
            get_json(state, "/api/v1/munchies?start=denver,co&end=pueblo,co&food=chinese").await;

        assert_eq!(status, StatusCode::OK);
        let data = &json["data"];
        assert_eq!(data["id"], serde_json::Value::Null);
        assert_eq!(data["type"], "munchie");
        assert_eq!(data["attributes"]["end_location"], "pueblo,co");
        assert_eq!(data["attributes"]["travel_time"]["text"], "1 hour 48 mins");
        assert_eq!(data["attributes"]["travel_time"]["value"], 6455);
        assert!(data["attributes"]["forecast"].is_string());

        let restaurant = data["attributes"]["restaurant"].as_object().unwrap();
        let keys: Vec<&str> = restaurant.keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"name") && keys.contains(&"address"));
    }

    #[tokio::test]
    async fn it_should_echo_end_location_verbatim() {
        let state = make_state(Arc::new(FixedTravel::default()), true, true);

        let (status, json) =
            get_json(state, "/api/v1/munchies?start=denver,co&end=Pueblo%2C%20CO&food=chinese").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["attributes"]["end_location"], "Pueblo, CO");
    }

    #[tokio::test]
    async fn it_should_return_400_without_calling_providers_when_food_is_missing() {
        let travel = Arc::new(FixedTravel::default());
        let state = make_state(travel.clone(), true, true);

        let (status, json) = get_json(state, "/api/v1/munchies?start=denver,co&end=pueblo,co").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["errors"][0]["status"], "400");
        assert_eq!(json["errors"][0]["title"], "Invalid input");
        assert!(json["errors"][0]["detail"].as_str().unwrap().contains("food"));
        assert_eq!(travel.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn it_should_return_400_when_a_parameter_is_blank() {
        let state = make_state(Arc::new(FixedTravel::default()), true, true);

        let (status, _) = get_json(state, "/api/v1/munchies?start=&end=pueblo,co&food=chinese").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn it_should_return_404_when_no_restaurant_is_open() {
        let state = make_state(Arc::new(FixedTravel::default()), false, true);

        let (status, json) =
            get_json(state, "/api/v1/munchies?start=denver,co&end=pueblo,co&food=chinese").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json.get("data").is_none());
        assert_eq!(json["errors"][0]["title"], "No result found");
    }

    #[tokio::test]
    async fn it_should_return_502_when_forecast_is_down() {
        let state = make_state(Arc::new(FixedTravel::default()), true, false);

        let (status, json) =
            get_json(state, "/api/v1/munchies?start=denver,co&end=pueblo,co&food=chinese").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(json["errors"][0]["detail"].as_str().unwrap().contains("openweather"));
    }

    #[tokio::test]
    async fn it_should_return_504_when_providers_are_too_slow() {
        let travel = Arc::new(FixedTravel { delay: Some(Duration::from_secs(5)), ..Default::default() });
        let mut state = make_state(travel, true, true);
        state.request_timeout = Duration::from_millis(20);

        let (status, json) =
            get_json(state, "/api/v1/munchies?start=denver,co&end=pueblo,co&food=chinese").await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(json["errors"][0]["title"], "Upstream timeout");
    }

    #[tokio::test]
    async fn it_should_report_health() {
        let state = make_state(Arc::new(FixedTravel::default()), true, true);

        let (status, json) = get_json(state, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }
}
