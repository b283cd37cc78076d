use std::{
    collections::BTreeSet,
    net::{IpAddr, SocketAddr, TcpStream},
    sync::LazyLock,
    time::Duration,
};

use regex::Regex;

const WILDCARD_BIND: &str = "0.0.0.0";
const LISTEN_PROBE_TIMEOUT: Duration = Duration::from_millis(500);

// e.g. `0.0.0.0:7000->7000/tcp` inside a `ps` status column.
static PORT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+\.\d+\.\d+\.\d+):(\d+)->(\d+)/(?:tcp|udp)").expect("port pattern compiles")
});

/// One externally reachable binding of a container port.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DockerPort {
    ip: String,
    external_port: u16,
    internal_port: u16,
}

impl DockerPort {
    pub fn new(ip: impl Into<String>, external_port: u16, internal_port: u16) -> Self {
        Self {
            ip: ip.into(),
            external_port,
            internal_port,
        }
    }

    #[must_use]
    pub fn ip(&self) -> &str {
        &self.ip
    }

    #[must_use]
    pub const fn external_port(&self) -> u16 {
        self.external_port
    }

    #[must_use]
    pub const fn internal_port(&self) -> u16 {
        self.internal_port
    }

    /// True when something accepts TCP connections on the external
    /// binding right now.
    #[must_use]
    pub fn is_listening_now(&self) -> bool {
        let Ok(ip) = self.ip.parse::<IpAddr>() else {
            return false;
        };
        let address = SocketAddr::new(ip, self.external_port);
        TcpStream::connect_timeout(&address, LISTEN_PROBE_TIMEOUT).is_ok()
    }
}

/// Port mappings of one service, unique per (external, internal) pair.
///
/// Transient query result: built from one `ps <service>` listing and
/// discarded after use, never cached.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ports(BTreeSet<DockerPort>);

impl Ports {
    pub fn new(ports: impl IntoIterator<Item = DockerPort>) -> Self {
        Self(ports.into_iter().collect())
    }

    /// Collect every `ip:external->internal/proto` binding out of a
    /// `ps <service>` listing. Wildcard `0.0.0.0` bind addresses are
    /// rewritten to `machine_ip`, the externally reachable daemon host.
    /// Lines without a binding pattern contribute nothing.
    #[must_use]
    pub fn parse_from_ps_output(output: &str, machine_ip: &str) -> Self {
        let mut ports = BTreeSet::new();
        for captures in PORT_PATTERN.captures_iter(output) {
            if let Ok(external) = captures[2].parse::<u16>()
                && let Ok(internal) = captures[3].parse::<u16>()
            {
                let ip = match &captures[1] {
                    WILDCARD_BIND => machine_ip,
                    bound => bound,
                };
                ports.insert(DockerPort::new(ip, external, internal));
            }
        }
        Self(ports)
    }

    /// Mapping whose container-side port is `internal_port`, if any.
    #[must_use]
    pub fn find_for_internal_port(&self, internal_port: u16) -> Option<&DockerPort> {
        self.0
            .iter()
            .find(|port| port.internal_port() == internal_port)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DockerPort> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for Ports {
    type Item = DockerPort;
    type IntoIter = <BTreeSet<DockerPort> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MACHINE_IP: &str = "192.168.99.100";

    #[test]
    fn parses_a_tcp_binding() {
        let ports = Ports::parse_from_ps_output("dir_db_1  Up  0.0.0.0:7000->7000/tcp", MACHINE_IP);
        assert_eq!(
            ports,
            Ports::new([DockerPort::new(MACHINE_IP, 7000, 7000)])
        );
    }

    #[test]
    fn parses_a_udp_binding() {
        let ports = Ports::parse_from_ps_output("dir_db_1  Up  10.0.0.2:514->514/udp", MACHINE_IP);
        assert_eq!(ports, Ports::new([DockerPort::new("10.0.0.2", 514, 514)]));
    }

    #[test]
    fn rewrites_wildcard_bindings_to_the_machine_ip() {
        let ports = Ports::parse_from_ps_output("0.0.0.0:7000->7001/tcp", MACHINE_IP);
        assert_eq!(
            ports.find_for_internal_port(7001),
            Some(&DockerPort::new(MACHINE_IP, 7000, 7001))
        );
    }

    #[test]
    fn a_wildcard_machine_ip_is_kept_verbatim() {
        let ports = Ports::parse_from_ps_output("0.0.0.0:7000->7000/tcp", "0.0.0.0");
        assert_eq!(ports, Ports::new([DockerPort::new("0.0.0.0", 7000, 7000)]));
    }

    #[test]
    fn keeps_explicit_bind_addresses() {
        let ports = Ports::parse_from_ps_output("127.0.0.1:5432->5432/tcp", MACHINE_IP);
        assert_eq!(
            ports,
            Ports::new([DockerPort::new("127.0.0.1", 5432, 5432)])
        );
    }

    #[test]
    fn collects_every_binding_on_a_line() {
        let line = "dir_web_1  Up  0.0.0.0:80->8080/tcp, 0.0.0.0:443->8443/tcp";
        let ports = Ports::parse_from_ps_output(line, MACHINE_IP);
        assert_eq!(ports.len(), 2);
        assert!(ports.find_for_internal_port(8080).is_some());
        assert!(ports.find_for_internal_port(8443).is_some());
    }

    #[test]
    fn lines_without_bindings_contribute_nothing() {
        let output = "Name   Command   State   Ports\ndir_db_1   entrypoint.sh   Up";
        assert!(Ports::parse_from_ps_output(output, MACHINE_IP).is_empty());
    }

    #[test]
    fn duplicate_bindings_collapse() {
        let output = "0.0.0.0:7000->7000/tcp\n0.0.0.0:7000->7000/tcp";
        assert_eq!(Ports::parse_from_ps_output(output, MACHINE_IP).len(), 1);
    }

    #[test]
    fn parsing_is_idempotent() {
        let output = "0.0.0.0:80->8080/tcp, 0.0.0.0:443->8443/tcp";
        assert_eq!(
            Ports::parse_from_ps_output(output, MACHINE_IP),
            Ports::parse_from_ps_output(output, MACHINE_IP)
        );
    }

    #[test]
    fn listening_probe_sees_a_bound_listener() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe listener");
        let port = listener.local_addr().expect("listener address").port();
        assert!(DockerPort::new("127.0.0.1", port, 80).is_listening_now());
    }

    #[test]
    fn listening_probe_rejects_an_unparseable_address() {
        assert!(!DockerPort::new("not-an-ip", 80, 80).is_listening_now());
    }
}
