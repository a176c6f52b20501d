//! Port to service-name lookup used by the verbose report.

use std::collections::BTreeMap;
use std::sync::OnceLock;

const WELL_KNOWN: &[(u16, &str)] = &[
    (7, "echo"), (9, "discard"), (13, "daytime"), (19, "chargen"), (20, "ftp-data"),
    (21, "ftp"), (22, "ssh"), (23, "telnet"), (25, "smtp"), (26, "rsftp"), (37, "time"),
    (53, "domain"), (79, "finger"), (80, "http"), (81, "hosts2-ns"), (88, "kerberos-sec"),
    (106, "pop3pw"), (110, "pop3"), (111, "rpcbind"), (113, "ident"), (119, "nntp"),
    (135, "msrpc"), (139, "netbios-ssn"), (143, "imap"), (144, "news"), (179, "bgp"),
    (199, "smux"), (389, "ldap"), (427, "svrloc"), (443, "https"), (444, "snpp"),
    (445, "microsoft-ds"), (465, "smtps"), (513, "login"), (514, "shell"), (515, "printer"),
    (543, "klogin"), (544, "kshell"), (548, "afp"), (554, "rtsp"), (587, "submission"),
    (631, "ipp"), (646, "ldp"), (873, "rsync"), (990, "ftps"), (993, "imaps"), (995, "pop3s"),
    (1025, "NFS-or-IIS"), (1026, "LSA-or-nterm"), (1433, "ms-sql-s"), (1720, "h323q931"),
    (1723, "pptp"), (1755, "wms"), (1900, "upnp"), (2000, "cisco-sccp"), (2001, "dc"),
    (2049, "nfs"), (2121, "ccproxy-ftp"), (2717, "pn-requester"), (3000, "ppp"),
    (3128, "squid-http"), (3306, "mysql"), (3389, "ms-wbt-server"), (4899, "radmin"),
    (5000, "upnp"), (5009, "airport-admin"), (5051, "ida-agent"), (5060, "sip"),
    (5101, "admdog"), (5190, "aol"), (5357, "wsdapi"), (5432, "postgresql"),
    (5631, "pcanywheredata"), (5666, "nrpe"), (5800, "vnc-http"), (5900, "vnc"),
    (6000, "X11"), (6001, "X11:1"), (6379, "redis"), (7070, "realserver"), (8000, "http-alt"),
    (8008, "http"), (8009, "ajp13"), (8080, "http-proxy"), (8081, "blackice-icecap"),
    (8443, "https-alt"), (8888, "sun-answerbook"), (9100, "jetdirect"), (9999, "abyss"),
    (10000, "snet-sensor-mgmt"), (27017, "mongod"), (32768, "filenet-tms"),
];

/// Read-only map from port number to service name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceTable {
    entries: BTreeMap<u16, String>,
}

impl ServiceTable {
    /// Process-wide table of well-known TCP services.
    pub fn builtin() -> &'static ServiceTable {
        static TABLE: OnceLock<ServiceTable> = OnceLock::new();
        TABLE.get_or_init(|| ServiceTable::from_pairs(WELL_KNOWN.iter().copied()))
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (u16, &'a str)>) -> Self {
        let mut entries = BTreeMap::new();
        for (port, name) in pairs {
            entries.entry(port).or_insert_with(|| name.to_string());
        }
        ServiceTable { entries }
    }

    /// Parse `/etc/services`-style text (`name port/proto [aliases...]`).
    /// Only tcp entries are kept and the first name listed for a port wins.
    /// Plain `port name` lines are accepted as well. Anything else is skipped.
    pub fn parse_services(content: &str) -> Self {
        let mut entries = BTreeMap::new();
        for line in content.lines() {
            let line = line.split('#').next().unwrap_or("");
            let mut fields = line.split_whitespace();
            let (Some(first), Some(second)) = (fields.next(), fields.next()) else { continue };
            let parsed = if let Ok(port) = first.parse::<u16>() {
                Some((port, second))
            } else {
                match second.split_once('/') {
                    Some((port, "tcp")) => port.parse::<u16>().ok().map(|p| (p, first)),
                    _ => None,
                }
            };
            if let Some((port, name)) = parsed {
                entries.entry(port).or_insert_with(|| name.to_string());
            }
        }
        ServiceTable { entries }
    }

    pub fn lookup(&self, port: u16) -> Option<&str> {
        self.entries.get(&port).map(String::as_str)
    }

    pub fn name_or_unknown(&self, port: u16) -> &str {
        self.lookup(port).unwrap_or("unknown")
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_knows_web_ports() {
        let t = ServiceTable::builtin();
        assert_eq!(t.lookup(80), Some("http"));
        assert_eq!(t.lookup(443), Some("https"));
        assert_eq!(t.lookup(22), Some("ssh"));
        assert_eq!(t.name_or_unknown(1), "unknown");
    }

    #[test]
    fn parse_etc_services_format() {
        let text = "\
# Network services
ssh             22/tcp                          # SSH Remote Login Protocol
domain          53/tcp
domain          53/udp
http            80/tcp          www             # WorldWideWeb HTTP
www-alt         80/tcp
snmp            161/udp
";
        let t = ServiceTable::parse_services(text);
        assert_eq!(t.lookup(22), Some("ssh"));
        assert_eq!(t.lookup(53), Some("domain"));
        assert_eq!(t.lookup(80), Some("http"));
        assert_eq!(t.lookup(161), None);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn parse_plain_pairs_and_skip_garbage() {
        let t = ServiceTable::parse_services("8080 proxy\nnot a line\n70000 big\n\n9000/tcp\n");
        assert_eq!(t.lookup(8080), Some("proxy"));
        assert_eq!(t.len(), 1);
    }
}
