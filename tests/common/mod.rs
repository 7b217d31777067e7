// tests/common/mod.rs

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use mrun::exec::{ProcessHandle, ProcessRunner, RunConfig};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Scripted behaviour for one display name.
#[derive(Debug, Clone, Copy)]
#[allow(dead_code)]
pub enum FakeBehaviour {
    /// Spawn fine, exit immediately with this code.
    Exit(i32),
    /// Spawn fine, sleep, then exit; lets tests steer completion order.
    ExitAfter(Duration, i32),
    /// Refuse to spawn at all.
    SpawnError,
    /// Spawn fine, then fail while waiting (a harness fault, not an exit).
    WaitFault,
}

/// A fake process runner that:
/// - records which display names were "spawned", in dispatch order
/// - tracks how many fake processes run at once (for parallelism checks)
/// - resolves each run according to its scripted [`FakeBehaviour`].
pub struct FakeRunner {
    script: HashMap<String, FakeBehaviour>,
    started: Arc<Mutex<Vec<RunConfig>>>,
    running: Arc<Mutex<usize>>,
    max_running: Arc<Mutex<usize>>,
}

#[allow(dead_code)]
impl FakeRunner {
    pub fn new(script: &[(&str, FakeBehaviour)]) -> Self {
        Self {
            script: script
                .iter()
                .map(|(name, b)| (name.to_string(), *b))
                .collect(),
            started: Arc::new(Mutex::new(Vec::new())),
            running: Arc::new(Mutex::new(0)),
            max_running: Arc::new(Mutex::new(0)),
        }
    }

    /// Display names spawned so far, in dispatch order.
    pub fn started_names(&self) -> Vec<String> {
        self.started
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.display_name.clone())
            .collect()
    }

    /// Full run configurations observed so far, in dispatch order.
    pub fn started_configs(&self) -> Vec<RunConfig> {
        self.started.lock().unwrap().clone()
    }

    /// High-water mark of concurrently running fake processes.
    pub fn max_seen_running(&self) -> usize {
        *self.max_running.lock().unwrap()
    }

    /// Fake processes that were spawned but never finished waiting.
    pub fn still_running(&self) -> usize {
        *self.running.lock().unwrap()
    }
}

impl ProcessRunner for FakeRunner {
    fn run_executable(
        &self,
        config: RunConfig,
    ) -> Pin<Box<dyn Future<Output = std::io::Result<Box<dyn ProcessHandle>>> + Send + '_>> {
        let behaviour = *self
            .script
            .get(&config.display_name)
            .unwrap_or(&FakeBehaviour::Exit(0));
        let started = Arc::clone(&self.started);
        let running = Arc::clone(&self.running);
        let max_running = Arc::clone(&self.max_running);

        Box::pin(async move {
            started.lock().unwrap().push(config.clone());

            if let FakeBehaviour::SpawnError = behaviour {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no such executable: {}", config.executable.display()),
                ));
            }

            {
                let mut running = running.lock().unwrap();
                *running += 1;
                let mut max = max_running.lock().unwrap();
                if *running > *max {
                    *max = *running;
                }
            }

            Ok(Box::new(FakeHandle {
                behaviour,
                name: config.display_name,
                running,
            }) as Box<dyn ProcessHandle>)
        })
    }
}

struct FakeHandle {
    behaviour: FakeBehaviour,
    name: String,
    running: Arc<Mutex<usize>>,
}

impl ProcessHandle for FakeHandle {
    fn wait(&mut self) -> Pin<Box<dyn Future<Output = anyhow::Result<i32>> + Send + '_>> {
        let behaviour = self.behaviour;
        let name = self.name.clone();
        let running = Arc::clone(&self.running);

        Box::pin(async move {
            let result = match behaviour {
                FakeBehaviour::Exit(code) => Ok(code),
                FakeBehaviour::ExitAfter(delay, code) => {
                    tokio::time::sleep(delay).await;
                    Ok(code)
                }
                FakeBehaviour::WaitFault => {
                    Err(anyhow::anyhow!("output stream broke for '{name}'"))
                }
                FakeBehaviour::SpawnError => {
                    unreachable!("spawn errors never produce a handle")
                }
            };

            *running.lock().unwrap() -= 1;
            result
        })
    }
}
