//! Authentication state: ticket and CSRF prevention token.

/// A Proxmox authentication ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket(String);

impl Ticket {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `Cookie` header value carrying this ticket.
    pub fn as_cookie_header(&self) -> String {
        format!("PVEAuthCookie={}", self.0)
    }
}

/// A CSRF prevention token, required on state-changing requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Authentication state obtained from a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Auth {
    ticket: Ticket,
    csrf_token: CsrfToken,
}

impl Auth {
    pub fn new(ticket: Ticket, csrf_token: CsrfToken) -> Self {
        Self { ticket, csrf_token }
    }

    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    pub fn csrf_token(&self) -> &CsrfToken {
        &self.csrf_token
    }
}
