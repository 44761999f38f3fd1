use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::collector::test_helpers::{MockWeatherProvider, RecordingStore, test_collector};
use crate::error::Error;


/// Poll until the user's task reaches a terminal state
async fn wait_terminal(collector: &WeatherCollector, user_id: UserId) -> TaskStatus {
    loop {
        let status = collector.status(user_id).await.unwrap();
        if status.is_terminal() {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
