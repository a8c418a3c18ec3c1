//! Service classification from port numbers and banner text.
//!
//! The base name comes from a static well-known port table. When a banner
//! is available it is matched against an ordered keyword table; the first
//! keyword found wins. The rule order is part of the output contract, so
//! overlapping rules (`http` before `http/`, `ssh` before `ssh-`) stay as
//! they are.

/// Label used when neither the port table nor a banner rule applies.
pub const UNKNOWN: &str = "unknown";

/// Well-known TCP services, sorted by port for binary search.
static WELL_KNOWN: &[(u16, &str)] = &[
    (20, "ftp-data"),
    (21, "ftp"),
    (22, "ssh"),
    (23, "telnet"),
    (25, "smtp"),
    (37, "time"),
    (43, "whois"),
    (53, "domain"),
    (69, "tftp"),
    (70, "gopher"),
    (79, "finger"),
    (80, "http"),
    (88, "kerberos"),
    (106, "pop3pw"),
    (110, "pop3"),
    (111, "sunrpc"),
    (113, "auth"),
    (119, "nntp"),
    (123, "ntp"),
    (135, "msrpc"),
    (137, "netbios-ns"),
    (138, "netbios-dgm"),
    (139, "netbios-ssn"),
    (143, "imap"),
    (161, "snmp"),
    (162, "snmptrap"),
    (179, "bgp"),
    (194, "irc"),
    (389, "ldap"),
    (443, "https"),
    (445, "microsoft-ds"),
    (464, "kpasswd"),
    (465, "submissions"),
    (513, "login"),
    (514, "shell"),
    (515, "printer"),
    (543, "klogin"),
    (544, "kshell"),
    (548, "afpovertcp"),
    (554, "rtsp"),
    (587, "submission"),
    (631, "ipp"),
    (636, "ldaps"),
    (873, "rsync"),
    (902, "vmware-auth"),
    (989, "ftps-data"),
    (990, "ftps"),
    (993, "imaps"),
    (995, "pop3s"),
    (1080, "socks"),
    (1194, "openvpn"),
    (1433, "ms-sql-s"),
    (1434, "ms-sql-m"),
    (1521, "oracle"),
    (1701, "l2tp"),
    (1723, "pptp"),
    (1812, "radius"),
    (1813, "radius-acct"),
    (1883, "mqtt"),
    (2049, "nfs"),
    (2181, "zookeeper"),
    (2375, "docker"),
    (2376, "docker-s"),
    (3128, "squid"),
    (3260, "iscsi-target"),
    (3306, "mysql"),
    (3389, "ms-wbt-server"),
    (3690, "svn"),
    (4369, "epmd"),
    (5060, "sip"),
    (5061, "sip-tls"),
    (5222, "xmpp-client"),
    (5269, "xmpp-server"),
    (5432, "postgresql"),
    (5672, "amqp"),
    (5900, "vnc"),
    (5984, "couchdb"),
    (6379, "redis"),
    (6443, "sun-sr-https"),
    (6667, "ircd"),
    (8008, "http-alt"),
    (8080, "http-alt"),
    (8443, "https-alt"),
    (9042, "cassandra"),
    (9092, "kafka"),
    (9200, "elasticsearch"),
    (9418, "git"),
    (10000, "webmin"),
    (11211, "memcache"),
    (27017, "mongodb"),
];

/// Ordered banner keyword rules: `(needle, label)`.
static BANNER_RULES: &[(&str, &str)] = &[
    ("nginx", "nginx"),
    ("apache", "apache"),
    ("iis", "iis"),
    ("tomcat", "tomcat"),
    ("ssh", "ssh"),
    ("smtp", "smtp"),
    ("esmtp", "smtp"),
    ("ftp", "ftp"),
    ("mysql", "mysql"),
    ("mariadb", "mysql"),
    ("postgres", "postgresql"),
    ("http", "http"),
    ("http/", "http"),
    ("ssl", "ssl"),
    ("openssl", "ssl"),
    ("ssh-", "ssh"),
    ("postfix", "smtp"),
    ("exim", "smtp"),
    ("dovecot", "imap/pop3"),
    ("imap", "imap"),
    ("pop3", "pop3"),
    ("rdp", "rdp"),
];

/// Look up the well-known service name for a TCP port.
pub fn service_name(port: u16) -> Option<&'static str> {
    WELL_KNOWN
        .binary_search_by_key(&port, |&(p, _)| p)
        .ok()
        .map(|i| WELL_KNOWN[i].1)
}

/// Service name for display, `"unknown"` when the port is not in the table.
pub fn service_description(port: u16) -> &'static str {
    service_name(port).unwrap_or(UNKNOWN)
}

/// Label the service on `port`, refined by `banner` when one was captured.
///
/// With a matching banner rule the result is `"<base> (<label>)"`, or just
/// the label when the port has no well-known name.
pub fn classify(port: u16, banner: Option<&str>) -> String {
    let base = service_name(port);

    let Some(banner) = banner else {
        return base.unwrap_or(UNKNOWN).to_string();
    };

    let lowered = banner.to_lowercase();
    match banner_label(&lowered) {
        Some(label) => match base {
            Some(base) => format!("{} ({})", base, label),
            None => label.to_string(),
        },
        None => base.unwrap_or(UNKNOWN).to_string(),
    }
}

fn banner_label(lowered: &str) -> Option<&'static str> {
    BANNER_RULES
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|&(_, label)| label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted() {
        assert!(WELL_KNOWN.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_common_ports() {
        assert_eq!(service_name(22), Some("ssh"));
        assert_eq!(service_name(80), Some("http"));
        assert_eq!(service_name(443), Some("https"));
        assert_eq!(service_name(3306), Some("mysql"));
    }

    #[test]
    fn test_unknown_port() {
        assert_eq!(service_name(12345), None);
        assert_eq!(service_description(12345), "unknown");
        assert_eq!(classify(9999, None), "unknown");
    }

    #[test]
    fn test_banner_refines_base_name() {
        assert_eq!(classify(22, Some("SSH-2.0-OpenSSH_8.9")), "ssh (ssh)");
        assert_eq!(
            classify(80, Some("HTTP/1.1 200 OK\r\nServer: nginx/1.24")),
            "http (nginx)"
        );
        assert_eq!(classify(22, None), "ssh");
    }

    #[test]
    fn test_banner_without_base_name() {
        assert_eq!(classify(2222, Some("SSH-2.0-dropbear")), "ssh");
        assert_eq!(classify(4444, Some("hello there")), "unknown");
        assert_eq!(classify(143, Some("* OK hello")), "imap");
    }

    #[test]
    fn test_first_rule_wins() {
        // "esmtp" also contains "smtp", which comes first.
        assert_eq!(classify(25, Some("220 mail ESMTP Postfix")), "smtp (smtp)");
        // "apache" precedes "http" even though "HTTP/" appears first in the text.
        assert_eq!(
            classify(8080, Some("HTTP/1.1 200 OK\r\nServer: Apache")),
            "http-alt (apache)"
        );
        // "dovecot" only matches once nothing earlier does.
        assert_eq!(classify(110, Some("+OK Dovecot ready.")), "pop3 (imap/pop3)");
        // "ssl" beats "openssl".
        assert_eq!(classify(5000, Some("OpenSSL banner")), "ssl");
    }
}
