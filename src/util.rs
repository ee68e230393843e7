use regex::Regex;
use std::sync::OnceLock;
use std::thread::sleep;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

static INIT_ONCE: std::sync::Once = std::sync::Once::new();
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
    });
}

/// Current unix time in whole seconds.
pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

static NEUTER_RE: OnceLock<Regex> = OnceLock::new();

/// Defang `!ping` triggers so reposted comment bodies can't summon group bots.
pub fn neuter_ping(body: &str) -> String {
    let re = NEUTER_RE.get_or_init(|| Regex::new(r"(?i)!ping").unwrap());
    re.replace_all(body, "*ping").into_owned()
}

/// Call `f` up to `tries` times, sleeping `delay_ms * attempt` between
/// failures. Returns the first success or the last error.
pub fn retry_with_backoff<T, E: std::fmt::Display>(
    tries: usize,
    delay_ms: u64,
    mut f: impl FnMut() -> Result<T, E>,
) -> Result<T, E> {
    let tries = tries.max(1);
    let mut last_err = None;
    for i in 0..tries {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) => {
                if i + 1 < tries {
                    tracing::warn!("attempt {}/{} failed: {e}, retrying", i + 1, tries);
                    sleep(Duration::from_millis(delay_ms.saturating_mul((i + 1) as u64)));
                }
                last_err = Some(e);
            }
        }
    }
    Err(last_err.expect("at least one attempt runs"))
}
