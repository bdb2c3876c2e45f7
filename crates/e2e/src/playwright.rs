//! Playwright browser automation over a line-delimited JSON bridge
//!
//! A small Node script is written to a temp directory and started with
//! `node`. It launches the browser, opens one page and then answers one
//! request per line on stdin. Console and page errors are pushed as events
//! on the same stdout stream and collected while waiting for replies.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::browser::{BrowserPage, CapturedError};
use crate::checklist::Viewport;
use crate::error::{SmokeError, SmokeResult};

const BRIDGE_SCRIPT: &str = r#"
const readline = require('readline');
const playwright = require('playwright');

const engine = process.env.PORTFOLIO_BRIDGE_BROWSER || 'chromium';
const headless = process.env.PORTFOLIO_BRIDGE_HEADLESS !== '0';
const actionTimeout = Number(process.env.PORTFOLIO_BRIDGE_ACTION_TIMEOUT_MS || 10000);

function send(message) {
  process.stdout.write(JSON.stringify(message) + '\n');
}

(async () => {
  const browser = await playwright[engine].launch({ headless });
  const context = await browser.newContext();
  const page = await context.newPage();
  page.setDefaultTimeout(actionTimeout);

  page.on('console', msg => {
    if (msg.type() === 'error') send({ event: 'console_error', text: msg.text() });
  });
  page.on('pageerror', error => send({ event: 'page_error', text: error.message }));

  const ops = {
    goto: async ({ url }) => { await page.goto(url, { waitUntil: 'networkidle' }); return null; },
    title: async () => page.title(),
    count: async ({ selector }) => page.locator(selector).count(),
    set_viewport: async ({ width, height }) => { await page.setViewportSize({ width, height }); return null; },
    click: async ({ selector }) => { await page.click(selector); return null; },
    bounding_top: async ({ selector }) => page.evaluate(sel => {
      const el = document.querySelector(sel);
      return el ? el.getBoundingClientRect().top : null;
    }, selector),
    ping: async () => null,
  };

  send({ event: 'ready' });

  const lines = readline.createInterface({ input: process.stdin });
  for await (const line of lines) {
    if (!line.trim()) continue;
    let request;
    try {
      request = JSON.parse(line);
    } catch (error) {
      send({ event: 'protocol_error', text: error.message });
      continue;
    }
    if (request.op === 'close') {
      await browser.close();
      send({ reply: request.id, ok: true, value: null });
      break;
    }
    const op = ops[request.op];
    if (!op) {
      send({ reply: request.id, ok: false, error: `unknown op '${request.op}'` });
      continue;
    }
    try {
      send({ reply: request.id, ok: true, value: await op(request) });
    } catch (error) {
      send({ reply: request.id, ok: false, error: error.message });
    }
  }
  await browser.close().catch(() => {});
  process.exit(0);
})().catch(error => {
  send({ event: 'fatal', text: error.message });
  process.exit(1);
});
"#;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl FromStr for Browser {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" => Ok(Browser::Webkit),
            other => Err(format!("unknown browser '{other}' (expected chromium, firefox or webkit)")),
        }
    }
}

/// Configuration for the Playwright bridge
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub browser: Browser,
    pub headless: bool,

    /// Run `npx playwright --version` before spawning the bridge
    pub check_install: bool,

    /// `node` executable
    pub node: PathBuf,

    /// Arguments passed to `node` ahead of the bridge script
    pub node_args: Vec<OsString>,

    /// Extra module directory so the bridge can `require('playwright')`
    /// from the temp directory it runs in
    pub node_modules: Option<PathBuf>,

    /// Time allowed for the browser to launch
    pub launch_timeout: Duration,

    /// Time allowed for one request to be answered
    pub command_timeout: Duration,

    /// Playwright's own timeout for navigation and clicks
    pub action_timeout: Duration,

    /// Grace period for the bridge to exit after `close` and after SIGTERM
    pub shutdown_grace: Duration,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            check_install: true,
            node: PathBuf::from("node"),
            node_args: Vec::new(),
            node_modules: std::env::current_dir().ok().map(|d| d.join("node_modules")),
            launch_timeout: Duration::from_secs(60),
            command_timeout: Duration::from_secs(30),
            action_timeout: Duration::from_secs(10),
            shutdown_grace: Duration::from_millis(500),
        }
    }
}

/// Check if Playwright is installed
pub async fn check_playwright_installed() -> SmokeResult<()> {
    let status = Command::new("npx")
        .args(["playwright", "--version"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => Ok(()),
        _ => Err(SmokeError::PlaywrightNotFound),
    }
}

/// A request to the bridge
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BridgeCommand {
    Goto { url: String },
    Title,
    Count { selector: String },
    SetViewport { width: u32, height: u32 },
    Click { selector: String },
    BoundingTop { selector: String },
    Ping,
    Close,
}

impl BridgeCommand {
    pub fn op(&self) -> &'static str {
        match self {
            BridgeCommand::Goto { .. } => "goto",
            BridgeCommand::Title => "title",
            BridgeCommand::Count { .. } => "count",
            BridgeCommand::SetViewport { .. } => "set_viewport",
            BridgeCommand::Click { .. } => "click",
            BridgeCommand::BoundingTop { .. } => "bounding_top",
            BridgeCommand::Ping => "ping",
            BridgeCommand::Close => "close",
        }
    }
}

#[derive(Serialize)]
struct Request<'a> {
    id: u64,
    #[serde(flatten)]
    command: &'a BridgeCommand,
}

/// Encode one request line, without the trailing newline
pub fn encode_request(id: u64, command: &BridgeCommand) -> SmokeResult<String> {
    Ok(serde_json::to_string(&Request { id, command })?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeEvent {
    Ready,
    ConsoleError,
    PageError,
    ProtocolError,
    Fatal,
}

/// A line received from the bridge
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BridgeMessage {
    Reply {
        reply: u64,
        ok: bool,
        #[serde(default)]
        value: Value,
        #[serde(default)]
        error: Option<String>,
    },
    Event {
        event: BridgeEvent,
        #[serde(default)]
        text: String,
    },
}

impl BridgeMessage {
    pub fn parse(line: &str) -> SmokeResult<Self> {
        Ok(serde_json::from_str(line)?)
    }
}

/// A running bridge process with one open page
pub struct PlaywrightSession {
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    errors: Vec<CapturedError>,
    command_timeout: Duration,
    shutdown_grace: Duration,
    closed: bool,

    /// Holds the bridge script until the session ends
    _script_dir: tempfile::TempDir,
}

impl PlaywrightSession {
    /// Check for Playwright, start the bridge and wait for the page to open
    pub async fn launch(config: &PlaywrightConfig) -> SmokeResult<Self> {
        if config.check_install {
            check_playwright_installed().await?;
        }

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.cjs");
        tokio::fs::write(&script_path, BRIDGE_SCRIPT).await?;
        debug!("Bridge script written to {}", script_path.display());

        let mut cmd = Command::new(&config.node);
        cmd.args(&config.node_args)
            .arg(&script_path)
            .current_dir(script_dir.path())
            .env("PORTFOLIO_BRIDGE_BROWSER", config.browser.as_str())
            .env("PORTFOLIO_BRIDGE_HEADLESS", if config.headless { "1" } else { "0" })
            .env(
                "PORTFOLIO_BRIDGE_ACTION_TIMEOUT_MS",
                config.action_timeout.as_millis().to_string(),
            )
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(node_path) = node_path(config.node_modules.as_ref()) {
            cmd.env("NODE_PATH", node_path);
        }

        let mut child = cmd.spawn().map_err(|e| {
            SmokeError::Bridge(format!("Failed to spawn {}: {}", config.node.display(), e))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SmokeError::Bridge("bridge stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SmokeError::Bridge("bridge stdout not captured".to_string()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("[bridge] {}", line);
                }
            });
        }

        let mut session = Self {
            child,
            stdin,
            lines: BufReader::new(stdout).lines(),
            next_id: 1,
            errors: Vec::new(),
            command_timeout: config.command_timeout,
            shutdown_grace: config.shutdown_grace,
            closed: false,
            _script_dir: script_dir,
        };

        info!("Launching {} (headless: {})", config.browser.as_str(), config.headless);
        match timeout(config.launch_timeout, session.wait_ready()).await {
            Ok(Ok(())) => Ok(session),
            Ok(Err(e)) => {
                session.terminate();
                Err(e)
            }
            Err(_) => {
                session.terminate();
                Err(SmokeError::CommandTimeout {
                    op: "launch",
                    timeout_ms: config.launch_timeout.as_millis() as u64,
                })
            }
        }
    }

    async fn next_message(&mut self) -> SmokeResult<BridgeMessage> {
        loop {
            let Some(line) = self.lines.next_line().await? else {
                return Err(SmokeError::BridgeClosed);
            };
            if line.trim().is_empty() {
                continue;
            }
            match BridgeMessage::parse(&line) {
                Ok(message) => return Ok(message),
                Err(e) => warn!("Ignoring bridge output '{}': {}", line, e),
            }
        }
    }

    /// Record an event; a fatal event becomes an error
    fn on_event(&mut self, event: BridgeEvent, text: String) -> SmokeResult<()> {
        match event {
            BridgeEvent::Ready => {}
            BridgeEvent::ConsoleError => {
                debug!("console error: {}", text);
                self.errors.push(CapturedError::console(text));
            }
            BridgeEvent::PageError => {
                debug!("page error: {}", text);
                self.errors.push(CapturedError::page(text));
            }
            BridgeEvent::ProtocolError => warn!("Bridge rejected a request: {}", text),
            BridgeEvent::Fatal => return Err(SmokeError::Bridge(text)),
        }
        Ok(())
    }

    async fn wait_ready(&mut self) -> SmokeResult<()> {
        loop {
            match self.next_message().await? {
                BridgeMessage::Event {
                    event: BridgeEvent::Ready,
                    ..
                } => return Ok(()),
                BridgeMessage::Event { event, text } => self.on_event(event, text)?,
                BridgeMessage::Reply { reply, .. } => debug!("Unexpected reply {} before ready", reply),
            }
        }
    }

    async fn wait_reply(&mut self, id: u64, op: &'static str) -> SmokeResult<Value> {
        loop {
            match self.next_message().await? {
                BridgeMessage::Event { event, text } => self.on_event(event, text)?,
                BridgeMessage::Reply {
                    reply, ok, value, error,
                } if reply == id => {
                    return if ok {
                        Ok(value)
                    } else {
                        Err(SmokeError::Browser {
                            op,
                            message: error.unwrap_or_else(|| "unknown error".to_string()),
                        })
                    };
                }
                BridgeMessage::Reply { reply, .. } => debug!("Discarding stale reply {}", reply),
            }
        }
    }

    /// Send one request and wait for its reply
    pub async fn call(&mut self, command: BridgeCommand) -> SmokeResult<Value> {
        if self.closed {
            return Err(SmokeError::BridgeClosed);
        }
        let id = self.next_id;
        self.next_id += 1;
        let op = command.op();

        let mut line = encode_request(id, &command)?;
        line.push('\n');
        debug!("-> {}", line.trim_end());
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        let limit = self.command_timeout;
        timeout(limit, self.wait_reply(id, op))
            .await
            .map_err(|_| SmokeError::CommandTimeout {
                op,
                timeout_ms: limit.as_millis() as u64,
            })?
    }

    /// SIGTERM, then kill; used when the bridge does not exit on its own
    fn terminate(&mut self) {
        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Ok(pid) = i32::try_from(pid) {
                let _ = kill(Pid::from_raw(pid), Signal::SIGTERM);
            }
        }
        let _ = self.child.start_kill();
    }

    async fn shutdown(&mut self) {
        if timeout(self.shutdown_grace, self.child.wait()).await.is_ok() {
            return;
        }

        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Ok(pid) = i32::try_from(pid) {
                if kill(Pid::from_raw(pid), Signal::SIGTERM).is_ok()
                    && timeout(self.shutdown_grace, self.child.wait()).await.is_ok()
                {
                    return;
                }
            }
        }

        warn!("Bridge did not exit, killing it");
        let _ = self.child.kill().await;
    }
}

/// `NODE_PATH` with `extra` in front of whatever the environment already has
fn node_path(extra: Option<&PathBuf>) -> Option<OsString> {
    let mut paths: Vec<PathBuf> = extra.into_iter().cloned().collect();
    if let Some(existing) = std::env::var_os("NODE_PATH") {
        paths.extend(std::env::split_paths(&existing));
    }
    if paths.is_empty() {
        return None;
    }
    std::env::join_paths(paths).ok()
}

#[async_trait]
impl BrowserPage for PlaywrightSession {
    async fn goto(&mut self, url: &str) -> SmokeResult<()> {
        self.call(BridgeCommand::Goto { url: url.to_string() })
            .await
            .map(drop)
            .map_err(|e| SmokeError::PageLoad {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn title(&mut self) -> SmokeResult<String> {
        let value = self.call(BridgeCommand::Title).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn count(&mut self, selector: &str) -> SmokeResult<usize> {
        let value = self
            .call(BridgeCommand::Count {
                selector: selector.to_string(),
            })
            .await?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| SmokeError::Bridge(format!("count returned {value}")))
    }

    async fn set_viewport(&mut self, viewport: Viewport) -> SmokeResult<()> {
        self.call(BridgeCommand::SetViewport {
            width: viewport.width,
            height: viewport.height,
        })
        .await
        .map(drop)
    }

    async fn click(&mut self, selector: &str) -> SmokeResult<()> {
        self.call(BridgeCommand::Click {
            selector: selector.to_string(),
        })
        .await
        .map(drop)
    }

    async fn bounding_top(&mut self, selector: &str) -> SmokeResult<Option<f64>> {
        let value = self
            .call(BridgeCommand::BoundingTop {
                selector: selector.to_string(),
            })
            .await?;
        Ok(value.as_f64())
    }

    async fn ping(&mut self) -> SmokeResult<()> {
        self.call(BridgeCommand::Ping).await.map(drop)
    }

    fn take_errors(&mut self) -> Vec<CapturedError> {
        std::mem::take(&mut self.errors)
    }

    async fn close(&mut self) -> SmokeResult<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.call(BridgeCommand::Close).await.map(drop);
        self.closed = true;
        self.shutdown().await;
        info!("Browser closed");
        result
    }
}

impl Drop for PlaywrightSession {
    fn drop(&mut self) {
        if !self.closed {
            self.terminate();
        }
    }
}
