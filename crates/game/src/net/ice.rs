use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde::Deserialize;

const GEO_TABLE_URL: &str =
    "https://raw.githubusercontent.com/pradt2/always-online-stun/master/geoip_cache.txt";
const CANDIDATE_LIST_URL: &str =
    "https://raw.githubusercontent.com/pradt2/always-online-stun/master/valid_ipv4s.txt";
const SELF_GEO_URL: &str = "https://geolocation-db.com/json/";

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// One relay/STUN server descriptor, as handed to connection
/// establishment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IceServer {
    pub urls: String,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServer {
    pub fn stun(urls: impl Into<String>) -> Self {
        Self {
            urls: urls.into(),
            username: None,
            credential: None,
        }
    }

    pub fn turn(
        urls: impl Into<String>,
        username: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            urls: urls.into(),
            username: Some(username.into()),
            credential: Some(credential.into()),
        }
    }
}

/// The static list used whenever ranking fails: one public STUN server
/// plus TURN relays with embedded credentials.
pub fn fallback_servers() -> Vec<IceServer> {
    vec![
        IceServer::stun("stun:stun.l.google.com:19302"),
        IceServer::stun("stun:stun.relay.metered.ca:80"),
        IceServer::turn(
            "turn:standard.relay.metered.ca:80",
            "c232ae0f3fd3138bec9ddb8b",
            "HudKCArjK0Mx62LU",
        ),
        IceServer::turn(
            "turn:standard.relay.metered.ca:80?transport=tcp",
            "c232ae0f3fd3138bec9ddb8b",
            "HudKCArjK0Mx62LU",
        ),
        IceServer::turn(
            "turn:standard.relay.metered.ca:443",
            "c232ae0f3fd3138bec9ddb8b",
            "HudKCArjK0Mx62LU",
        ),
        IceServer::turn(
            "turns:standard.relay.metered.ca:443?transport=tcp",
            "c232ae0f3fd3138bec9ddb8b",
            "HudKCArjK0Mx62LU",
        ),
    ]
}

#[derive(Debug, thiserror::Error)]
pub enum CandidateError {
    #[error("fetch failed: {0}")]
    Http(Box<ureq::Error>),
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("no candidate had a geo entry")]
    NoCandidates,
}

impl From<ureq::Error> for CandidateError {
    fn from(e: ureq::Error) -> Self {
        CandidateError::Http(Box::new(e))
    }
}

#[derive(Debug, Deserialize)]
struct GeoCoord {
    latitude: f64,
    longitude: f64,
}

/// Picks the candidate whose geo coordinate is nearest to the caller,
/// by Euclidean distance in lat/long space. Candidates without a geo
/// entry are skipped.
fn nearest_candidate(
    geo_table: &HashMap<String, [f64; 2]>,
    latitude: f64,
    longitude: f64,
    candidates: &str,
) -> Option<String> {
    candidates
        .lines()
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .filter_map(|addr| {
            let ip = addr.split(':').next()?;
            let [lat, lon] = geo_table.get(ip)?;
            let dist = ((latitude - lat).powi(2) + (longitude - lon).powi(2)).sqrt();
            Some((addr.to_string(), dist))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(addr, _)| addr)
}

fn fetch_ranked_servers() -> Result<Vec<IceServer>, CandidateError> {
    let geo_table: HashMap<String, [f64; 2]> = ureq::get(GEO_TABLE_URL)
        .timeout(FETCH_TIMEOUT)
        .call()?
        .into_json()?;
    let own: GeoCoord = ureq::get(SELF_GEO_URL)
        .timeout(FETCH_TIMEOUT)
        .call()?
        .into_json()?;
    let candidates = ureq::get(CANDIDATE_LIST_URL)
        .timeout(FETCH_TIMEOUT)
        .call()?
        .into_string()?;

    let nearest = nearest_candidate(&geo_table, own.latitude, own.longitude, &candidates)
        .ok_or(CandidateError::NoCandidates)?;
    log::info!("using closest STUN server: stun:{nearest}");

    let mut servers = fallback_servers();
    servers.insert(0, IceServer::stun(format!("stun:{nearest}")));
    Ok(servers)
}

/// Ranks relay/STUN candidates in the background. Selection never
/// blocks or fails session startup: callers poll `try_servers` or
/// bound the wait with `wait`, and every failure path degrades to the
/// static fallback list.
pub struct CandidateSelector {
    rx: mpsc::Receiver<Vec<IceServer>>,
    servers: Option<Vec<IceServer>>,
}

impl CandidateSelector {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("ice-candidates".to_string())
            .spawn(move || {
                let servers = match fetch_ranked_servers() {
                    Ok(servers) => servers,
                    Err(e) => {
                        log::warn!("candidate ranking failed, using fallback list: {e}");
                        fallback_servers()
                    }
                };
                let _ = tx.send(servers);
            });
        if let Err(e) = spawned {
            log::warn!("could not spawn candidate thread: {e}");
        }

        Self { rx, servers: None }
    }

    /// Non-blocking: the ranked list once selection finished.
    pub fn try_servers(&mut self) -> Option<&[IceServer]> {
        if self.servers.is_none() {
            if let Ok(servers) = self.rx.try_recv() {
                self.servers = Some(servers);
            }
        }
        self.servers.as_deref()
    }

    /// Waits for selection up to `timeout`, then settles for the
    /// fallback list. Connection attempts call this so they never run
    /// with an incomplete list.
    pub fn wait(&mut self, timeout: Duration) -> Vec<IceServer> {
        if self.servers.is_none() {
            match self.rx.recv_timeout(timeout) {
                Ok(servers) => self.servers = Some(servers),
                Err(_) => {
                    log::warn!("candidate selection did not finish in time, using fallback list");
                    self.servers = Some(fallback_servers());
                }
            }
        }
        self.servers.clone().unwrap_or_else(fallback_servers)
    }
}
