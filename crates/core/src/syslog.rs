//! Syslog-style system logs from a handful of daemons.
//!
//! Each daemon's message shapes are spelled out as enum variants with named
//! fields, and each variant knows how to render itself. There is no template
//! table to look fields up in at runtime.

use std::{
    fmt,
    io::Write,
    net::Ipv4Addr,
};

use rand::{seq::IndexedRandom, Rng};
use time::{
    format_description::BorrowedFormatItem,
    macros::{format_description, offset},
    Date, Duration, OffsetDateTime, UtcOffset,
};

use crate::{err::Result, window::TimeWindow};

/// `2025-09-01T13:05:09.042+01:00`
pub const ISO_TIME: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3][offset_hour sign:mandatory]:[offset_minute]"
);

const KUBELET_DATE: &[BorrowedFormatItem<'static>] = format_description!("[month][day]");
const KUBELET_TIME: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second]");

const OFFSETS: &[UtcOffset] = &[offset!(+1), UtcOffset::UTC];

/// Window length used unless overridden.
pub const DEFAULT_DAYS: u32 = 12;

pub const HOSTS: &[Ipv4Addr] = &[
    Ipv4Addr::new(192, 168, 0, 10),
    Ipv4Addr::new(10, 0, 2, 5),
    Ipv4Addr::new(172, 16, 5, 22),
    Ipv4Addr::new(8, 8, 4, 4),
    Ipv4Addr::new(203, 0, 113, 55),
];

const SERVICES: &[&str] = &[
    "rsyslog.service",
    "logrotate.service",
    "kubelet.service",
    "ssh.service",
    "nginx.service",
];
const DESCRIPTIONS: &[&str] = &[
    "Rotate log files.",
    "The Kubernetes Node Agent.",
    "Secure Shell Daemon.",
    "Web Server.",
    "System Logger.",
    "User management.",
];
const DAEMONS: &[&str] = &["rsyslogd", "sshd", "nginx", "kubelet", "python", "java"];
const USERS: &[&str] = &["alice", "bob", "carol", "daniel", "eve", "frank"];
const ACTIONS: &[&str] = &[
    "login",
    "logout",
    "update_profile",
    "delete_account",
    "upload_file",
];
const ERRORS: &[&str] = &[
    "timeout",
    "connection refused",
    "invalid data",
    "permission denied",
    "not found",
];
const SIGNALS: &[&str] = &["HUP", "TERM", "USR1", "USR2"];
const SERVER_NAMES: &[&str] = &["localhost", "api.internal", "www.example.com"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl Level {
    const ALL: &'static [Level] = &[
        Level::Debug,
        Level::Info,
        Level::Notice,
        Level::Warning,
        Level::Error,
        Level::Critical,
        Level::Alert,
        Level::Emergency,
    ];
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Notice => "NOTICE",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
            Level::Alert => "ALERT",
            Level::Emergency => "EMERGENCY",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemdEvent {
    SentSighup {
        service: &'static str,
        pid: u32,
        daemon: &'static str,
    },
    Deactivated {
        service: &'static str,
    },
    Finished {
        service: &'static str,
        description: &'static str,
    },
    ConsumedCpu {
        service: &'static str,
        millis: u32,
    },
    RestartScheduled {
        service: &'static str,
        counter: u32,
    },
    Stopped {
        service: &'static str,
        description: &'static str,
    },
    Started {
        service: &'static str,
        description: &'static str,
    },
}

impl fmt::Display for SystemdEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemdEvent::SentSighup {
                service,
                pid,
                daemon,
            } => write!(
                f,
                "{service}: Sent signal SIGHUP to main process {pid} ({daemon}) on client request."
            ),
            SystemdEvent::Deactivated { service } => write!(f, "{service}: Deactivated successfully."),
            SystemdEvent::Finished {
                service,
                description,
            } => write!(f, "Finished {service} - {description}."),
            SystemdEvent::ConsumedCpu { service, millis } => write!(
                f,
                "{service}: Consumed {}.{:03}s CPU time.",
                millis / 1000,
                millis % 1000
            ),
            SystemdEvent::RestartScheduled { service, counter } => write!(
                f,
                "{service}: Scheduled restart job, restart counter is at {counter}."
            ),
            SystemdEvent::Stopped {
                service,
                description,
            } => write!(f, "Stopped {service} - {description}."),
            SystemdEvent::Started {
                service,
                description,
            } => write!(f, "Started {service} - {description}."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SshdEvent {
    Accepted {
        user: &'static str,
        from: Ipv4Addr,
        port: u16,
    },
    Failed {
        user: &'static str,
        from: Ipv4Addr,
        port: u16,
    },
    Closed {
        from: Ipv4Addr,
        port: u16,
    },
    Disconnected {
        from: Ipv4Addr,
        port: u16,
        reason: &'static str,
    },
    PamFailure {
        user: &'static str,
        from: Ipv4Addr,
    },
}

impl fmt::Display for SshdEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SshdEvent::Accepted { user, from, port } => {
                write!(f, "Accepted password for {user} from {from} port {port} ssh2")
            }
            SshdEvent::Failed { user, from, port } => {
                write!(f, "Failed password for {user} from {from} port {port} ssh2")
            }
            SshdEvent::Closed { from, port } => {
                write!(f, "Connection closed by {from} port {port} [preauth]")
            }
            SshdEvent::Disconnected { from, port, reason } => write!(
                f,
                "Received disconnect from {from} port {port}: {reason} [preauth]"
            ),
            SshdEvent::PamFailure { user, from } => {
                write!(f, "PAM authentication failure for {user} from {from}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelEvent {
    CgroupInit,
    Memory { available_kb: u32, total_kb: u32 },
    Throttled { cpu: u8 },
    LinkDown { eth: u8 },
    Ext4Mounted,
    UsbDisconnect { bus: u8, device: u8 },
}

impl fmt::Display for KernelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelEvent::CgroupInit => f.write_str("Initializing cgroup subsys cpuset"),
            KernelEvent::Memory {
                available_kb,
                total_kb,
            } => write!(f, "Memory: {available_kb}K/{total_kb}K available"),
            KernelEvent::Throttled { cpu } => write!(
                f,
                "CPU{cpu}: Core temperature above threshold, cpu clock throttled"
            ),
            KernelEvent::LinkDown { eth } => write!(f, "eth{eth}: Link is Down"),
            KernelEvent::Ext4Mounted => {
                f.write_str("EXT4-fs (sda1): mounted filesystem with ordered data mode")
            }
            KernelEvent::UsbDisconnect { bus, device } => {
                write!(f, "usb {bus}-1: USB disconnect, device number {device}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KubeletEvent {
    DeprecatedRuntimeEndpoint,
    DeprecatedInfraImage,
    Version { line: u16, version: (u8, u8, u8) },
    GolangSettings { line: u16 },
    ClientRotation { line: u16 },
    RuntimeConfigFailed { line: u16 },
}

impl KubeletEvent {
    /// klog-style lines carry a severity letter, `MMDD`, wall time and pid
    /// taken from the surrounding record.
    fn render(&self, date: &str, time: &str, pid: u32) -> String {
        match self {
            KubeletEvent::DeprecatedRuntimeEndpoint => "Flag --container-runtime-endpoint has been deprecated, This parameter should be set via the config file specified by the Kubelet's --config flag.".to_string(),
            KubeletEvent::DeprecatedInfraImage => "Flag --pod-infra-container-image has been deprecated, will be removed in a future release.".to_string(),
            KubeletEvent::Version { line, version: (major, minor, patch) } => format!(
                "I{date} {time} {pid} server.go:{line}] \"Kubelet version\" kubeletVersion=\"v{major}.{minor}.{patch}\""
            ),
            KubeletEvent::GolangSettings { line } => format!(
                "I{date} {time} {pid} server.go:{line}] \"Golang settings\" GOGC=\"\" GOMAXPROCS=\"\" GOTRACEBACK=\"\""
            ),
            KubeletEvent::ClientRotation { line } => format!(
                "I{date} {time} {pid} server.go:{line}] \"Client rotation is on, will bootstrap in background\""
            ),
            KubeletEvent::RuntimeConfigFailed { line } => format!(
                "E{date} {time} {pid} log.go:{line}] \"RuntimeConfig from runtime service failed\" err=\"rpc error: code = Unimplemented desc = unknown method RuntimeConfig for service runtime.v1.RuntimeService\""
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NginxEvent {
    WorkerStarted,
    WorkerExited {
        signal: &'static str,
    },
    Reloading,
    ClosedWaiting,
    InvalidMethod {
        client: Ipv4Addr,
        server: &'static str,
    },
}

impl fmt::Display for NginxEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NginxEvent::WorkerStarted => f.write_str("worker process started"),
            NginxEvent::WorkerExited { signal } => {
                write!(f, "worker process exited on signal {signal}")
            }
            NginxEvent::Reloading => f.write_str("reloading configuration"),
            NginxEvent::ClosedWaiting => f.write_str("connection closed while waiting for request"),
            NginxEvent::InvalidMethod { client, server } => write!(
                f,
                "client sent invalid method while reading client request line, client: {client}, server: {server}"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    JobStarted { job: u16 },
    TaskCompleted { task: u16 },
    CacheMiss { key: u16 },
    LoggedIn { user: &'static str },
    UserAction {
        user: &'static str,
        action: &'static str,
    },
    ApiError { error: &'static str },
    PoolSize { size: u8 },
    DebugInfo { var: u8, ok: bool },
}

impl fmt::Display for AppEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppEvent::JobStarted { job } => write!(f, "Started background job job{job}"),
            AppEvent::TaskCompleted { task } => {
                write!(f, "Completed task task{task} successfully")
            }
            AppEvent::CacheMiss { key } => write!(f, "Cache miss for key key_{key}"),
            AppEvent::LoggedIn { user } => write!(f, "User {user} logged in"),
            AppEvent::UserAction { user, action } => write!(f, "User {user} performed {action}"),
            AppEvent::ApiError { error } => write!(f, "API error: {error}"),
            AppEvent::PoolSize { size } => write!(f, "DB connection pool size: {size}"),
            AppEvent::DebugInfo { var, ok } => write!(
                f,
                "Debug info: var={var}; state={}",
                if *ok { "ok" } else { "fail" }
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Systemd(SystemdEvent),
    Sshd(SshdEvent),
    Kernel { level: Level, event: KernelEvent },
    Kubelet(KubeletEvent),
    Nginx(NginxEvent),
    MyApp { level: Level, event: AppEvent },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyslogRecord {
    pub timestamp: OffsetDateTime,
    pub host: Ipv4Addr,
    pub pid: u32,
    pub message: Message,
}

impl SyslogRecord {
    /// `<timestamp> <host> <tag>: <message>`, without a trailing newline.
    pub fn render(&self) -> Result<String> {
        let ts = self.timestamp.format(ISO_TIME)?;
        let (host, pid) = (self.host, self.pid);
        Ok(match &self.message {
            Message::Systemd(event) => format!("{ts} {host} systemd[1]: {event}"),
            Message::Sshd(event) => format!("{ts} {host} sshd[{pid}]: {event}"),
            Message::Kernel { level, event } => format!("{ts} {host} kernel: [{ts}] {level} {event}"),
            Message::Kubelet(event) => {
                let date = self.timestamp.format(KUBELET_DATE)?;
                let time = self.timestamp.format(KUBELET_TIME)?;
                format!("{ts} {host} kubelet[{pid}]: {}", event.render(&date, &time, pid))
            }
            Message::Nginx(event) => format!("{ts} {host} nginx[{pid}]: {event}"),
            Message::MyApp { level, event } => format!("{ts} {host} myapp[{pid}]: [{level}] {event}"),
        })
    }
}

pub fn write_records<W: Write + ?Sized>(w: &mut W, records: &[SyslogRecord]) -> Result<()> {
    for record in records {
        w.write_all(record.render()?.as_bytes())?;
        w.write_all(b"\n")?;
    }
    Ok(())
}

/// Default window: [DEFAULT_DAYS] days from `start`.
pub fn window(start: Date, days: u32) -> TimeWindow {
    TimeWindow::days_from(start, days, OFFSETS)
}

fn any<T: Copy, R: Rng + ?Sized>(items: &[T], or: T, rng: &mut R) -> T {
    items.choose(rng).copied().unwrap_or(or)
}

pub struct SyslogGenerator {
    window: TimeWindow,
}

impl SyslogGenerator {
    pub fn new(window: TimeWindow) -> Result<Self> {
        window.validate()?;
        Ok(Self { window })
    }

    pub fn generate<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<SyslogRecord> {
        (0..count).map(|_| self.record(rng)).collect()
    }

    pub fn record<R: Rng + ?Sized>(&self, rng: &mut R) -> SyslogRecord {
        let timestamp = self
            .window
            .sample(rng)
            .saturating_add(Duration::milliseconds(rng.random_range(0..1000)));
        let host = any(HOSTS, Ipv4Addr::LOCALHOST, rng);
        let pid = rng.random_range(100..=2_000_000);
        let message = match rng.random_range(0..6) {
            0 => Message::Systemd(systemd(pid, rng)),
            1 => Message::Sshd(sshd(rng)),
            2 => Message::Kernel {
                level: any(Level::ALL, Level::Info, rng),
                event: kernel(rng),
            },
            3 => Message::Kubelet(kubelet(rng)),
            4 => Message::Nginx(nginx(rng)),
            _ => Message::MyApp {
                level: any(Level::ALL, Level::Info, rng),
                event: app(rng),
            },
        };
        SyslogRecord {
            timestamp,
            host,
            pid,
            message,
        }
    }
}

fn systemd<R: Rng + ?Sized>(pid: u32, rng: &mut R) -> SystemdEvent {
    let service = any(SERVICES, "unknown", rng);
    match rng.random_range(0..7) {
        0 => SystemdEvent::SentSighup {
            service,
            pid,
            daemon: any(DAEMONS, "unknown", rng),
        },
        1 => SystemdEvent::Deactivated { service },
        2 => SystemdEvent::Finished {
            service,
            description: any(DESCRIPTIONS, "unknown", rng),
        },
        3 => SystemdEvent::ConsumedCpu {
            service,
            millis: rng.random_range(1..=20_000),
        },
        4 => SystemdEvent::RestartScheduled {
            service,
            counter: rng.random_range(1..=500_000),
        },
        5 => SystemdEvent::Stopped {
            service,
            description: any(DESCRIPTIONS, "unknown", rng),
        },
        _ => SystemdEvent::Started {
            service,
            description: any(DESCRIPTIONS, "unknown", rng),
        },
    }
}

fn sshd<R: Rng + ?Sized>(rng: &mut R) -> SshdEvent {
    let from = any(HOSTS, Ipv4Addr::LOCALHOST, rng);
    match rng.random_range(0..5) {
        0 => SshdEvent::Accepted {
            user: any(USERS, "unknown", rng),
            from,
            port: rng.random_range(1024..=65535),
        },
        1 => SshdEvent::Failed {
            user: any(USERS, "unknown", rng),
            from,
            port: rng.random_range(1024..=65535),
        },
        2 => SshdEvent::Closed {
            from,
            port: rng.random_range(1024..=65535),
        },
        3 => SshdEvent::Disconnected {
            from,
            port: rng.random_range(1024..=65535),
            reason: any(ERRORS, "unknown", rng),
        },
        _ => SshdEvent::PamFailure {
            user: any(USERS, "unknown", rng),
            from,
        },
    }
}

fn kernel<R: Rng + ?Sized>(rng: &mut R) -> KernelEvent {
    match rng.random_range(0..6) {
        0 => KernelEvent::CgroupInit,
        1 => KernelEvent::Memory {
            available_kb: rng.random_range(1024..=32_768),
            total_kb: rng.random_range(32_768..=65_536),
        },
        2 => KernelEvent::Throttled {
            cpu: rng.random_range(0..=3),
        },
        3 => KernelEvent::LinkDown {
            eth: rng.random_range(0..=3),
        },
        4 => KernelEvent::Ext4Mounted,
        _ => KernelEvent::UsbDisconnect {
            bus: rng.random_range(1..=7),
            device: rng.random_range(1..=50),
        },
    }
}

fn kubelet<R: Rng + ?Sized>(rng: &mut R) -> KubeletEvent {
    let line = rng.random_range(10..=1000);
    match rng.random_range(0..6) {
        0 => KubeletEvent::DeprecatedRuntimeEndpoint,
        1 => KubeletEvent::DeprecatedInfraImage,
        2 => KubeletEvent::Version {
            line,
            version: (
                rng.random_range(1..=2),
                rng.random_range(0..=99),
                rng.random_range(0..=99),
            ),
        },
        3 => KubeletEvent::GolangSettings { line },
        4 => KubeletEvent::ClientRotation { line },
        _ => KubeletEvent::RuntimeConfigFailed { line },
    }
}

fn nginx<R: Rng + ?Sized>(rng: &mut R) -> NginxEvent {
    match rng.random_range(0..5) {
        0 => NginxEvent::WorkerStarted,
        1 => NginxEvent::WorkerExited {
            signal: any(SIGNALS, "unknown", rng),
        },
        2 => NginxEvent::Reloading,
        3 => NginxEvent::ClosedWaiting,
        _ => NginxEvent::InvalidMethod {
            client: any(HOSTS, Ipv4Addr::LOCALHOST, rng),
            server: any(SERVER_NAMES, "unknown", rng),
        },
    }
}

fn app<R: Rng + ?Sized>(rng: &mut R) -> AppEvent {
    match rng.random_range(0..8) {
        0 => AppEvent::JobStarted {
            job: rng.random_range(1000..=9999),
        },
        1 => AppEvent::TaskCompleted {
            task: rng.random_range(1000..=9999),
        },
        2 => AppEvent::CacheMiss {
            key: rng.random_range(100..=999),
        },
        3 => AppEvent::LoggedIn {
            user: any(USERS, "unknown", rng),
        },
        4 => AppEvent::UserAction {
            user: any(USERS, "unknown", rng),
            action: any(ACTIONS, "unknown", rng),
        },
        5 => AppEvent::ApiError {
            error: any(ERRORS, "unknown", rng),
        },
        6 => AppEvent::PoolSize {
            size: rng.random_range(1..=100),
        },
        _ => AppEvent::DebugInfo {
            var: rng.random_range(1..=99),
            ok: rng.random_bool(0.5),
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{rng::seeded, window::DEFAULT_START};
    use time::macros::datetime;

    fn at(message: Message) -> SyslogRecord {
        SyslogRecord {
            timestamp: datetime!(2025-09-04 7:08:09.123 +1),
            host: Ipv4Addr::new(10, 0, 2, 5),
            pid: 4242,
            message,
        }
    }

    #[test]
    fn empty_catalogs_fall_back() {
        let mut rng = seeded(9);
        assert_eq!(any::<&str, _>(&[], "unknown", &mut rng), "unknown");
        assert!(USERS.contains(&any(USERS, "unknown", &mut rng)));
    }

    #[test]
    fn renders_tag_per_daemon() {
        let cases = [
            (
                Message::Systemd(SystemdEvent::ConsumedCpu {
                    service: "ssh.service",
                    millis: 1_005,
                }),
                "2025-09-04T07:08:09.123+01:00 10.0.2.5 systemd[1]: ssh.service: Consumed 1.005s CPU time.",
            ),
            (
                Message::Sshd(SshdEvent::Closed {
                    from: Ipv4Addr::new(8, 8, 4, 4),
                    port: 50022,
                }),
                "2025-09-04T07:08:09.123+01:00 10.0.2.5 sshd[4242]: Connection closed by 8.8.4.4 port 50022 [preauth]",
            ),
            (
                Message::Kernel {
                    level: Level::Warning,
                    event: KernelEvent::LinkDown { eth: 2 },
                },
                "2025-09-04T07:08:09.123+01:00 10.0.2.5 kernel: [2025-09-04T07:08:09.123+01:00] WARNING eth2: Link is Down",
            ),
            (
                Message::Kubelet(KubeletEvent::Version {
                    line: 120,
                    version: (1, 30, 2),
                }),
                "2025-09-04T07:08:09.123+01:00 10.0.2.5 kubelet[4242]: I0904 07:08:09 4242 server.go:120] \"Kubelet version\" kubeletVersion=\"v1.30.2\"",
            ),
            (
                Message::Nginx(NginxEvent::WorkerExited { signal: "HUP" }),
                "2025-09-04T07:08:09.123+01:00 10.0.2.5 nginx[4242]: worker process exited on signal HUP",
            ),
            (
                Message::MyApp {
                    level: Level::Error,
                    event: AppEvent::DebugInfo { var: 7, ok: false },
                },
                "2025-09-04T07:08:09.123+01:00 10.0.2.5 myapp[4242]: [ERROR] Debug info: var=7; state=fail",
            ),
        ];
        for (message, expected) in cases {
            assert_eq!(at(message).render().unwrap(), expected);
        }
    }

    #[test]
    fn generated_lines_have_no_unfilled_fields() {
        let gen = SyslogGenerator::new(window(DEFAULT_START.date(), DEFAULT_DAYS)).unwrap();
        let mut out = Vec::new();
        write_records(&mut out, &gen.generate(3000, &mut seeded(30))).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 3000);
        for line in text.lines() {
            assert!(!line.contains('{') && !line.contains('}'), "{line}");
            let (_, rest) = line.split_once(' ').unwrap();
            let (host, _) = rest.split_once(' ').unwrap();
            assert!(HOSTS.contains(&host.parse().unwrap()));
        }
    }

    #[test]
    fn same_seed_same_lines() {
        let gen = SyslogGenerator::new(window(DEFAULT_START.date(), DEFAULT_DAYS)).unwrap();
        assert_eq!(
            gen.generate(200, &mut seeded(31)),
            gen.generate(200, &mut seeded(31))
        );
    }
}
