//! Background fetches.
//!
//! Every job runs on its own short-lived named thread with blocking
//! clients and posts its outcome over an mpsc channel. The UI thread
//! drains the channel once per frame, so controller and form state are
//! only ever touched from one thread.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use serde_json::Value;

use crate::api::{ApiClient, ApiResult, CitySearch, ListQuery, TokenResponse};
use crate::controller::{Completion, Fetch};
use crate::data::{Dataset, ReferenceLoader, ReferenceSource};
use crate::forms::{AuthRequest, FormKind};

#[derive(Clone, Debug)]
pub enum Job {
    Map(Fetch),
    Auth(AuthRequest),
}

#[derive(Debug)]
pub enum Outcome {
    Map(Completion),
    Auth {
        kind: FormKind,
        result: Result<TokenResponse, String>,
    },
}

struct Services {
    api: ApiClient,
    reference: ReferenceLoader,
    world: ReferenceSource,
    us: ReferenceSource,
}

impl Services {
    fn source(&self, dataset: Dataset) -> &ReferenceSource {
        match dataset {
            Dataset::World => &self.world,
            Dataset::UsStates => &self.us,
        }
    }
}

pub struct Dispatcher {
    services: Arc<Services>,
    tx: Sender<Outcome>,
    rx: Receiver<Outcome>,
}

impl Dispatcher {
    pub fn new(api: ApiClient, reference: ReferenceLoader, world: String, us: String) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            services: Arc::new(Services {
                api,
                reference,
                world: ReferenceSource {
                    dataset: Dataset::World,
                    location: world,
                },
                us: ReferenceSource {
                    dataset: Dataset::UsStates,
                    location: us,
                },
            }),
            tx,
            rx,
        }
    }

    /// Run a job in the background
    pub fn submit(&self, job: Job) {
        let name = thread_name(&job);
        let services = Arc::clone(&self.services);
        let tx = self.tx.clone();

        tracing::debug!(thread = %name, "dispatching");
        let fallback = job.clone();
        let spawned = spawn_thread(name, move || {
            // Receiver gone means the app is shutting down
            let _ = tx.send(run(&services, job));
        });

        if let Err(e) = spawned {
            tracing::error!(error = %e, "could not spawn worker thread");
            let _ = self.tx.send(failed(fallback, format!("Could not start request: {e}")));
        }
    }

    pub fn submit_all(&self, fetches: impl IntoIterator<Item = Fetch>) {
        for fetch in fetches {
            self.submit(Job::Map(fetch));
        }
    }

    /// Outcomes that arrived since the last call
    pub fn drain(&self) -> Vec<Outcome> {
        self.rx.try_iter().collect()
    }

    #[cfg(test)]
    fn recv_timeout(&self, timeout: std::time::Duration) -> Option<Outcome> {
        self.rx.recv_timeout(timeout).ok()
    }
}

/// Spawn a thread that inherits the current tracing dispatcher.
fn spawn_thread<F>(name: String, f: F) -> io::Result<thread::JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    let dispatch = tracing::dispatcher::get_default(|current| current.clone());
    thread::Builder::new()
        .name(name)
        .spawn(move || tracing::dispatcher::with_default(&dispatch, f))
}

fn thread_name(job: &Job) -> String {
    match job {
        Job::Map(Fetch::Boundaries(dataset)) => format!("fetch-{}", dataset.object()),
        Job::Map(Fetch::Countries) => "fetch-countries-index".into(),
        Job::Map(Fetch::States) => "fetch-states-index".into(),
        Job::Map(Fetch::Cities { token, .. }) => format!("fetch-cities-{token}"),
        Job::Auth(AuthRequest::Login(_)) => "auth-login".into(),
        Job::Auth(AuthRequest::Register(_)) => "auth-register".into(),
    }
}

fn run(services: &Services, job: Job) -> Outcome {
    match job {
        Job::Map(fetch) => Outcome::Map(run_fetch(services, fetch)),
        Job::Auth(AuthRequest::Login(credentials)) => Outcome::Auth {
            kind: FormKind::Login,
            result: services.api.login(&credentials).map_err(|e| e.to_string()),
        },
        Job::Auth(AuthRequest::Register(registration)) => Outcome::Auth {
            kind: FormKind::Register,
            result: services.api.register(&registration).map_err(|e| e.to_string()),
        },
    }
}

fn run_fetch(services: &Services, fetch: Fetch) -> Completion {
    let api = &services.api;
    match fetch {
        Fetch::Boundaries(dataset) => Completion::Boundaries {
            dataset,
            result: services
                .reference
                .load(services.source(dataset))
                .map_err(|e| format!("{e:#}")),
        },
        Fetch::Countries => Completion::Countries(rendered(api.list_countries(&ListQuery::default()))),
        Fetch::States => Completion::States(rendered(api.list_states(&ListQuery::default()))),
        Fetch::Cities { token, state_code } => Completion::Cities {
            token,
            result: rendered(api.search_cities(&CitySearch::in_state(state_code))),
        },
    }
}

fn rendered(result: ApiResult<Value>) -> Result<Value, String> {
    result.map_err(|e| e.to_string())
}

/// Outcome reporting that `job` never ran
fn failed(job: Job, message: String) -> Outcome {
    match job {
        Job::Map(Fetch::Boundaries(dataset)) => Outcome::Map(Completion::Boundaries {
            dataset,
            result: Err(message),
        }),
        Job::Map(Fetch::Countries) => Outcome::Map(Completion::Countries(Err(message))),
        Job::Map(Fetch::States) => Outcome::Map(Completion::States(Err(message))),
        Job::Map(Fetch::Cities { token, .. }) => Outcome::Map(Completion::Cities {
            token,
            result: Err(message),
        }),
        Job::Auth(request) => Outcome::Auth {
            kind: match request {
                AuthRequest::Login(_) => FormKind::Login,
                AuthRequest::Register(_) => FormKind::Register,
            },
            result: Err(message),
        },
    }
}
