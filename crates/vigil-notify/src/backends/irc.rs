// irc.rs - Notifier that posts events to an IRC channel.
//
// `IrcNotifier` itself only enqueues text. A background task owns the
// connection: it registers, joins the channel, answers PINGs and drains the
// queue at no more than one PRIVMSG per second. Dropped connections are
// retried with exponential backoff; queued lines survive reconnects.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use vigil_state::LifecycleEvent;

use super::{required, runtime_handle};
use crate::config::IrcSettings;
use crate::error::NotifyError;
use crate::notifier::Notifier;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);
const LINE_INTERVAL: Duration = Duration::from_secs(1);
/// Nick tried after the server rejects the configured one as erroneous.
const FALLBACK_NICK: &str = "vigil";

/// Connection parameters for the background client.
#[derive(Debug, Clone)]
struct ClientConfig {
    server: String,
    port: u16,
    nick: String,
    channel: String,
}

/// Posts every lifecycle event to the configured channel.
pub struct IrcNotifier {
    tx: mpsc::UnboundedSender<String>,
}

impl IrcNotifier {
    /// Validate `settings` and start the background client on the current
    /// tokio runtime.
    pub fn from_settings(settings: &IrcSettings) -> Result<Self, NotifyError> {
        let server = required("irc", &settings.server, "server")?;
        let channel = required("irc", &settings.channel, "channel")?;
        if !channel.starts_with('#') && !channel.starts_with('&') {
            return Err(NotifyError::InvalidSetting {
                notifier: "irc",
                setting: "channel",
                details: format!("'{}' must start with '#' or '&'", channel),
            });
        }
        if settings.nick.trim().is_empty() || settings.nick.contains(' ') {
            return Err(NotifyError::InvalidSetting {
                notifier: "irc",
                setting: "nick",
                details: format!("'{}' is not a usable nickname", settings.nick),
            });
        }

        let handle = runtime_handle("irc")?;
        let config = ClientConfig {
            server,
            port: settings.port,
            nick: settings.nick.clone(),
            channel,
        };
        let (tx, rx) = mpsc::unbounded_channel();
        handle.spawn(run_client(config, rx));

        Ok(Self { tx })
    }

    fn post(&self, unit: &str, event: LifecycleEvent) -> Result<(), NotifyError> {
        self.tx
            .send(event.summary(unit))
            .map_err(|_| NotifyError::ChannelClosed { notifier: "irc" })
    }
}

impl Notifier for IrcNotifier {
    fn name(&self) -> &str {
        "irc"
    }

    fn normal_start(&self, unit: &str) -> Result<(), NotifyError> {
        self.post(unit, LifecycleEvent::NormalStart)
    }

    fn normal_stop(&self, unit: &str) -> Result<(), NotifyError> {
        self.post(unit, LifecycleEvent::NormalStop)
    }

    fn failure(&self, unit: &str) -> Result<(), NotifyError> {
        self.post(unit, LifecycleEvent::Failure)
    }

    fn ongoing_failure(&self, unit: &str) -> Result<(), NotifyError> {
        self.post(unit, LifecycleEvent::OngoingFailure)
    }

    fn recovery(&self, unit: &str) -> Result<(), NotifyError> {
        self.post(unit, LifecycleEvent::Recovery)
    }

    fn change_from_unknown(&self, unit: &str) -> Result<(), NotifyError> {
        self.post(unit, LifecycleEvent::ChangeFromUnknown)
    }
}

// ── Wire format ──

/// One parsed IRC protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct IrcMessage {
    prefix: Option<String>,
    command: String,
    params: Vec<String>,
}

impl IrcMessage {
    fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);

        let prefix = match rest.strip_prefix(':') {
            Some(stripped) => {
                let (prefix, tail) = stripped.split_once(' ')?;
                rest = tail;
                Some(prefix.to_string())
            }
            None => None,
        };

        let (head, trailing) = match rest.split_once(" :") {
            Some((head, trailing)) => (head, Some(trailing)),
            None => (rest, None),
        };

        let mut parts = head.split_whitespace();
        let command = parts.next()?.to_ascii_uppercase();
        let mut params: Vec<String> = parts.map(str::to_string).collect();
        if let Some(trailing) = trailing {
            params.push(trailing.to_string());
        }

        Some(Self {
            prefix,
            command,
            params,
        })
    }

    /// Nickname part of the prefix (`nick!user@host`).
    fn source_nick(&self) -> Option<&str> {
        self.prefix
            .as_deref()
            .map(|p| p.split(['!', '@']).next().unwrap_or(p))
    }

    fn last_param(&self) -> &str {
        self.params.last().map(String::as_str).unwrap_or("")
    }
}

// ── Client task ──

/// Queue and status shared across reconnects.
#[derive(Debug, Default)]
struct ClientState {
    pending: VecDeque<String>,
    /// The notifier was dropped; quit once `pending` is drained.
    closed: bool,
    joined: bool,
}

enum SessionEnd {
    Quit,
    Disconnected,
}

async fn run_client(config: ClientConfig, mut rx: mpsc::UnboundedReceiver<String>) {
    let mut state = ClientState::default();
    let mut backoff = INITIAL_BACKOFF;

    loop {
        state.joined = false;
        match TcpStream::connect((config.server.as_str(), config.port)).await {
            Ok(stream) => {
                tracing::info!(server = %config.server, port = config.port, "connected to IRC server");
                match run_session(stream, &config, &mut rx, &mut state).await {
                    Ok(SessionEnd::Quit) => {
                        tracing::debug!(server = %config.server, "IRC client finished");
                        return;
                    }
                    Ok(SessionEnd::Disconnected) => {
                        tracing::warn!(server = %config.server, "IRC server closed the connection");
                    }
                    Err(e) => {
                        tracing::warn!(server = %config.server, error = %e, "IRC connection failed");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    server = %config.server,
                    port = config.port,
                    error = %e,
                    "could not connect to IRC server"
                );
            }
        }

        if state.closed && state.pending.is_empty() {
            return;
        }
        if state.joined {
            backoff = INITIAL_BACKOFF;
        }
        tracing::debug!(retry_in_secs = backoff.as_secs(), "reconnecting to IRC server");
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

async fn run_session(
    stream: TcpStream,
    config: &ClientConfig,
    rx: &mut mpsc::UnboundedReceiver<String>,
    state: &mut ClientState,
) -> io::Result<SessionEnd> {
    let (read_half, mut writer) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();
    let mut nick = config.nick.clone();

    send_line(&mut writer, &format!("NICK {}", nick)).await?;
    send_line(&mut writer, &format!("USER {} 0 * :vigil service monitor", nick)).await?;

    let mut ticker = tokio::time::interval(LINE_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(SessionEnd::Disconnected);
                };
                let Some(msg) = IrcMessage::parse(&line) else {
                    continue;
                };
                match msg.command.as_str() {
                    "PING" => {
                        send_line(&mut writer, &format!("PONG :{}", msg.last_param())).await?;
                    }
                    // RPL_WELCOME: registration is complete. The first
                    // parameter is the nick the server actually assigned.
                    "001" => {
                        if let Some(assigned) = msg.params.first() {
                            nick = assigned.clone();
                        }
                        send_line(&mut writer, &format!("JOIN {}", config.channel)).await?;
                    }
                    // ERR_ERRONEUSNICKNAME
                    "432" => {
                        if nick.starts_with(FALLBACK_NICK) {
                            nick.push('_');
                        } else {
                            nick = FALLBACK_NICK.to_string();
                        }
                        tracing::debug!(nick = %nick, "nickname rejected, retrying");
                        send_line(&mut writer, &format!("NICK {}", nick)).await?;
                    }
                    // ERR_NICKNAMEINUSE
                    "433" => {
                        nick.push('_');
                        tracing::debug!(nick = %nick, "nickname in use, retrying");
                        send_line(&mut writer, &format!("NICK {}", nick)).await?;
                    }
                    "JOIN" if msg.source_nick() == Some(nick.as_str())
                        && msg
                            .params
                            .first()
                            .is_some_and(|c| c.eq_ignore_ascii_case(&config.channel)) =>
                    {
                        tracing::info!(channel = %config.channel, nick = %nick, "joined IRC channel");
                        state.joined = true;
                    }
                    "ERROR" => {
                        tracing::warn!(reason = msg.last_param(), "IRC server sent ERROR");
                        return Ok(SessionEnd::Disconnected);
                    }
                    _ => {}
                }
            }
            text = rx.recv(), if !state.closed => {
                match text {
                    Some(text) => state.pending.push_back(text),
                    None => state.closed = true,
                }
            }
            _ = ticker.tick(), if state.joined => {
                if let Some(text) = state.pending.pop_front() {
                    let line = format!("PRIVMSG {} :{}", config.channel, single_line(&text));
                    if let Err(e) = send_line(&mut writer, &line).await {
                        state.pending.push_front(text);
                        return Err(e);
                    }
                } else if state.closed {
                    send_line(&mut writer, "QUIT :vigil shutting down").await?;
                    return Ok(SessionEnd::Quit);
                }
            }
        }
    }
}

async fn send_line(writer: &mut OwnedWriteHalf, line: &str) -> io::Result<()> {
    tracing::trace!(line, "irc >>");
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\r\n").await?;
    writer.flush().await
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::Lines;
    use tokio::net::tcp::OwnedReadHalf;
    use tokio::net::TcpListener;

    #[test]
    fn parse_with_prefix_and_trailing() {
        let msg = IrcMessage::parse(":alice!a@host PRIVMSG #ops :hello there\r\n").unwrap();
        assert_eq!(msg.prefix.as_deref(), Some("alice!a@host"));
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.params, vec!["#ops", "hello there"]);
        assert_eq!(msg.source_nick(), Some("alice"));
    }

    #[test]
    fn parse_without_prefix() {
        let msg = IrcMessage::parse("PING :irc.example.org").unwrap();
        assert!(msg.prefix.is_none());
        assert_eq!(msg.command, "PING");
        assert_eq!(msg.last_param(), "irc.example.org");
    }

    #[test]
    fn parse_numeric_and_empty() {
        let msg = IrcMessage::parse(":srv 433 * vigil :Nickname is already in use").unwrap();
        assert_eq!(msg.command, "433");
        assert_eq!(msg.params.len(), 3);
        assert!(IrcMessage::parse("").is_none());
        assert!(IrcMessage::parse(":only-a-prefix").is_none());
    }

    #[test]
    fn missing_server_is_reported_before_runtime() {
        let err = IrcNotifier::from_settings(&IrcSettings::default())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            NotifyError::MissingSetting {
                notifier: "irc",
                setting: "server"
            }
        ));
    }

    #[test]
    fn channel_needs_a_prefix() {
        let settings = IrcSettings {
            server: Some("irc.example.org".into()),
            channel: Some("ops".into()),
            ..IrcSettings::default()
        };
        let err = IrcNotifier::from_settings(&settings).err().unwrap();
        assert!(matches!(
            err,
            NotifyError::InvalidSetting {
                setting: "channel",
                ..
            }
        ));
    }

    #[test]
    fn needs_a_runtime() {
        let settings = IrcSettings {
            server: Some("irc.example.org".into()),
            channel: Some("#ops".into()),
            ..IrcSettings::default()
        };
        let err = IrcNotifier::from_settings(&settings).err().unwrap();
        assert!(matches!(err, NotifyError::NoRuntime { notifier: "irc" }));
    }

    fn settings_for(listener: &TcpListener) -> IrcSettings {
        IrcSettings {
            server: Some("127.0.0.1".into()),
            port: listener.local_addr().unwrap().port(),
            nick: "vigil".into(),
            channel: Some("#ops".into()),
        }
    }

    async fn expect(lines: &mut Lines<BufReader<OwnedReadHalf>>, want: &str) {
        let got = tokio::time::timeout(Duration::from_secs(10), lines.next_line())
            .await
            .expect("timed out waiting for client")
            .unwrap()
            .expect("client closed connection");
        assert_eq!(got, want);
    }

    async fn reply(writer: &mut OwnedWriteHalf, line: &str) {
        writer.write_all(format!("{}\r\n", line).as_bytes()).await.unwrap();
    }

    #[tokio::test]
    async fn registers_joins_and_posts() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let notifier = IrcNotifier::from_settings(&settings_for(&listener)).unwrap();
        // Queued before the connection exists.
        notifier.failure("/unit/a").unwrap();

        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, mut writer) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();

        expect(&mut lines, "NICK vigil").await;
        expect(&mut lines, "USER vigil 0 * :vigil service monitor").await;
        reply(&mut writer, ":srv 001 vigil :Welcome").await;
        reply(&mut writer, "PING :token-1").await;
        expect(&mut lines, "JOIN #ops").await;
        expect(&mut lines, "PONG :token-1").await;
        reply(&mut writer, ":vigil!v@localhost JOIN #ops").await;

        expect(&mut lines, "PRIVMSG #ops :/unit/a entered failed state.").await;
        notifier.recovery("/unit/a").unwrap();
        expect(&mut lines, "PRIVMSG #ops :/unit/a recovered.").await;

        drop(notifier);
        expect(&mut lines, "QUIT :vigil shutting down").await;
    }

    #[tokio::test]
    async fn nickname_collision_appends_underscore() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let _notifier = IrcNotifier::from_settings(&settings_for(&listener)).unwrap();

        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, mut writer) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();

        expect(&mut lines, "NICK vigil").await;
        expect(&mut lines, "USER vigil 0 * :vigil service monitor").await;
        reply(&mut writer, ":srv 433 * vigil :Nickname is already in use").await;
        expect(&mut lines, "NICK vigil_").await;
    }

    #[tokio::test]
    async fn assigned_nick_is_used_to_recognise_the_join() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let notifier = IrcNotifier::from_settings(&settings_for(&listener)).unwrap();
        notifier.failure("/unit/c").unwrap();

        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, mut writer) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();

        expect(&mut lines, "NICK vigil").await;
        expect(&mut lines, "USER vigil 0 * :vigil service monitor").await;
        // The server truncates the nick on registration.
        reply(&mut writer, ":srv 001 vigi :Welcome").await;
        expect(&mut lines, "JOIN #ops").await;
        reply(&mut writer, ":vigi!v@localhost JOIN #ops").await;
        expect(&mut lines, "PRIVMSG #ops :/unit/c entered failed state.").await;
    }

    #[tokio::test]
    async fn erroneous_nickname_falls_back_to_the_default() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut settings = settings_for(&listener);
        settings.nick = "9lives".into();
        let _notifier = IrcNotifier::from_settings(&settings).unwrap();

        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, mut writer) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();

        expect(&mut lines, "NICK 9lives").await;
        expect(&mut lines, "USER 9lives 0 * :vigil service monitor").await;
        reply(&mut writer, ":srv 432 * 9lives :Erroneous Nickname").await;
        expect(&mut lines, "NICK vigil").await;
        reply(&mut writer, ":srv 432 * vigil :Erroneous Nickname").await;
        expect(&mut lines, "NICK vigil_").await;
    }

    #[tokio::test]
    async fn queue_survives_reconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let notifier = IrcNotifier::from_settings(&settings_for(&listener)).unwrap();
        notifier.normal_start("/unit/b").unwrap();

        // First connection is dropped before registration completes.
        {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, _writer) = stream.into_split();
            let mut lines = BufReader::new(read_half).lines();
            expect(&mut lines, "NICK vigil").await;
        }

        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, mut writer) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();
        expect(&mut lines, "NICK vigil").await;
        expect(&mut lines, "USER vigil 0 * :vigil service monitor").await;
        reply(&mut writer, ":srv 001 vigil :Welcome").await;
        expect(&mut lines, "JOIN #ops").await;
        reply(&mut writer, ":vigil!v@localhost JOIN #ops").await;
        expect(&mut lines, "PRIVMSG #ops :/unit/b started normally.").await;
    }
}
