//! Server capabilities advertised in the EHLO reply.

/// Extensions a server advertised after EHLO.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Server hostname, the first word of the EHLO reply.
    pub hostname: String,
    /// STARTTLS is offered.
    pub starttls: bool,
    /// Advertised AUTH mechanisms, uppercased.
    pub auth: Vec<String>,
    /// Maximum message size in bytes, if advertised with a value.
    pub max_size: Option<usize>,
    /// 8BITMIME is offered.
    pub eight_bit_mime: bool,
}

impl Capabilities {
    /// Builds capabilities from the lines of an EHLO reply.
    ///
    /// The first line is the server greeting; each later line names one
    /// extension, optionally followed by parameters.
    #[must_use]
    pub fn from_ehlo(lines: &[String]) -> Self {
        let mut caps = Self {
            hostname: lines
                .first()
                .and_then(|line| line.split_whitespace().next())
                .unwrap_or_default()
                .to_string(),
            ..Self::default()
        };

        for line in lines.iter().skip(1) {
            let mut words = line.split_whitespace();
            let Some(keyword) = words.next() else {
                continue;
            };
            match keyword.to_ascii_uppercase().as_str() {
                "STARTTLS" => caps.starttls = true,
                "AUTH" => caps.auth.extend(words.map(str::to_ascii_uppercase)),
                "SIZE" => {
                    caps.max_size = words.next().and_then(|s| s.parse().ok()).filter(|&n| n > 0);
                }
                "8BITMIME" => caps.eight_bit_mime = true,
                _ => tracing::trace!(extension = line.as_str(), "ignoring extension"),
            }
        }
        caps
    }

    /// Checks if the server offers an AUTH mechanism.
    #[must_use]
    pub fn supports_auth(&self, mechanism: &str) -> bool {
        self.auth.iter().any(|m| m.eq_ignore_ascii_case(mechanism))
    }
}
