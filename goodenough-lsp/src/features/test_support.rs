use crate::server::LspClient;
use goodenough_index::testing::{file, MemoryFileProvider};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower_lsp::async_trait;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{ConfigurationItem, MessageType, Registration};

pub(crate) const SHAPES: &str = r"package shapes

import scala.math.Pi
import java.util.UUID

trait Shape { def area: Double }
class Circle(r: Double) extends Shape {
  def area = Pi * r * r
}";

pub(crate) const USAGES: &str = r"package app

object Main {
  val unit = new Circle(1.0)
  def describe(s: Shape) = s.area
}";

pub(crate) fn sample_workspace() -> Arc<MemoryFileProvider> {
    Arc::new(MemoryFileProvider::new([
        file("shapes/Shapes.scala", SHAPES),
        file("app/Main.scala", USAGES),
    ]))
}

/// Client double that records what the server tells it and answers with canned settings.
#[derive(Clone, Default)]
pub(crate) struct RecordingClient {
    pub logs: Arc<Mutex<Vec<String>>>,
    pub registrations: Arc<Mutex<Vec<String>>>,
    pub settings: Arc<Mutex<Value>>,
}

impl RecordingClient {
    pub fn with_settings(settings: Value) -> Self {
        let client = Self::default();
        *client.settings.lock().unwrap() = settings;
        client
    }

    pub fn logs(&self) -> Vec<String> {
        self.logs.lock().unwrap().clone()
    }
}

#[async_trait]
impl LspClient for RecordingClient {
    async fn log_message(&self, _: MessageType, message: String) {
        self.logs.lock().unwrap().push(message);
    }

    async fn register_capability(&self, registrations: Vec<Registration>) -> Result<()> {
        self.registrations
            .lock()
            .unwrap()
            .extend(registrations.into_iter().map(|r| r.method));
        Ok(())
    }

    async fn configuration(&self, items: Vec<ConfigurationItem>) -> Result<Vec<Value>> {
        let settings = self.settings.lock().unwrap().clone();
        Ok(items.iter().map(|_| settings.clone()).collect())
    }

    async fn machine_id(&self) -> Result<String> {
        Ok("test-machine".to_string())
    }
}
