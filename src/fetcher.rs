use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::settings::Settings;

/// Anything that can turn a URL into page markup.
///
/// Implementations must swallow their own failures: an empty string means
/// "not found" or "could not fetch", never a fatal error.
pub trait PageSource: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = String> + Send;
}

/// HTTP page source backed by a shared reqwest client.
pub struct WikiClient {
    client: reqwest::Client,
}

impl WikiClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(WikiClient { client })
    }

    async fn try_fetch(&self, url: &str) -> reqwest::Result<String> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

impl PageSource for WikiClient {
    async fn fetch(&self, url: &str) -> String {
        let start = Instant::now();
        match self.try_fetch(url).await {
            Ok(body) => {
                debug!(url, bytes = body.len(), ms = start.elapsed().as_millis() as u64, "fetched");
                body
            }
            Err(e) => {
                warn!(url, error = %e, "fetch failed");
                String::new()
            }
        }
    }
}

/// Article URL for a display name.
pub fn page_url(base: &str, name: &str) -> String {
    format!("{}/wiki/{}", base.trim_end_matches('/'), name.trim().replace(' ', "_"))
}

/// Absolute URL for an href found inside a page.
pub fn link_url(base: &str, href: &str) -> String {
    let base = base.trim_end_matches('/');
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{}", rest)
    } else if href.starts_with('/') {
        format!("{}{}", base, href)
    } else {
        format!("{}/wiki/{}", base, href)
    }
}

pub struct FetchStats {
    pub total: usize,
    pub ok: usize,
    pub empty: usize,
}

/// Fetch every URL with at most `concurrency` requests in flight.
///
/// The returned bodies line up with `urls` by index; `None` entries are not
/// fetched and come back empty.
pub async fn fetch_all<S: PageSource>(
    source: Arc<S>,
    urls: Vec<Option<String>>,
    concurrency: usize,
    label: &str,
) -> (Vec<String>, FetchStats) {
    let total = urls.len();
    let concurrency = concurrency.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {msg} {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb.set_message(label.to_string());

    // Workers send (index, body); slots restore input order
    let (tx, mut rx) = tokio::sync::mpsc::channel::<(usize, String)>(concurrency * 2);

    for (idx, url) in urls.into_iter().enumerate() {
        let Some(url) = url else {
            pb.inc(1);
            continue;
        };
        let source = Arc::clone(&source);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let Ok(_permit) = sem.acquire_owned().await else {
                return;
            };
            let body = source.fetch(&url).await;
            let _ = tx.send((idx, body)).await;
        });
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut bodies = vec![String::new(); total];
    while let Some((idx, body)) = rx.recv().await {
        bodies[idx] = body;
        pb.inc(1);
    }
    pb.finish_and_clear();

    let ok = bodies.iter().filter(|b| !b.is_empty()).count();
    let stats = FetchStats {
        total,
        ok,
        empty: total - ok,
    };
    info!(phase = label, total = stats.total, ok = stats.ok, empty = stats.empty, "fetch phase done");
    (bodies, stats)
}
