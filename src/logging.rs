use std::sync::Mutex;

/// Number of fetch log lines kept in memory
const MAX_LOGS: usize = 100;

/// Global log storage for feed requests
static HTTP_LOGS: Mutex<Vec<String>> = Mutex::new(Vec::new());

fn push(line: String) {
    if let Ok(mut logs) = HTTP_LOGS.lock() {
        let timestamp = chrono::Local::now().format("%H:%M:%S");
        logs.push(format!("[{}] {}", timestamp, line));
        if logs.len() > MAX_LOGS {
            logs.remove(0);
        }
    }
}

/// Log a feed request made through a fetch strategy
pub fn log_request(strategy: &str, url: &str) {
    log::debug!("{} GET {}", strategy, url);
    push(format!("{} GET {}", strategy, url));
}

/// Log a feed response
pub fn log_response(status: u16, url: &str) {
    log::debug!("<- {} {}", status, url);
    push(format!("<- {} {}", status, url));
}

/// Log a strategy that failed before or after getting a response
pub fn log_failure(strategy: &str, reason: &str) {
    log::info!("{} failed, trying next: {}", strategy, reason);
    push(format!("!! {} {}", strategy, reason));
}

/// Get recent logs for display, newest first
pub fn get_recent_logs(count: usize) -> Vec<String> {
    if let Ok(logs) = HTTP_LOGS.lock() {
        logs.iter().rev().take(count).cloned().collect()
    } else {
        Vec::new()
    }
}
