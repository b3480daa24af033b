//! Login and registration forms.
//!
//! A form collects its fields, validates them and hands back an
//! [`AuthRequest`] for the dispatcher; the result comes back through
//! [`AuthForm::complete`], which stores the token via [`Session`].

use crate::api::{Credentials, Registration, TokenResponse};
use crate::session::Session;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormKind {
    Login,
    Register,
}

impl FormKind {
    pub fn title(self) -> &'static str {
        match self {
            FormKind::Login => "Welcome Back",
            FormKind::Register => "Create Account",
        }
    }

    pub fn submit_label(self) -> &'static str {
        match self {
            FormKind::Login => "Login",
            FormKind::Register => "Register",
        }
    }

    pub fn progress_label(self) -> &'static str {
        match self {
            FormKind::Login => "Logging in...",
            FormKind::Register => "Creating Account...",
        }
    }

    fn failure_fallback(self) -> &'static str {
        match self {
            FormKind::Login => "Login failed",
            FormKind::Register => "Registration failed",
        }
    }

    fn success_message(self) -> &'static str {
        match self {
            FormKind::Login => "Login successful!",
            FormKind::Register => "Account created!",
        }
    }

    pub fn fields(self) -> &'static [Field] {
        match self {
            FormKind::Login => &[Field::Email, Field::Password],
            FormKind::Register => &[Field::Username, Field::Email, Field::Password],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Username,
    Email,
    Password,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::Username => "Username",
            Field::Email => "Email",
            Field::Password => "Password",
        }
    }

    pub fn is_secret(self) -> bool {
        self == Field::Password
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FormStatus {
    #[default]
    Idle,
    Submitting,
    Failed(String),
    Succeeded(&'static str),
}

/// Request a submitted form asks the dispatcher to send
#[derive(Clone, Debug)]
pub enum AuthRequest {
    Login(Credentials),
    Register(Registration),
}

#[derive(Debug)]
pub struct AuthForm {
    kind: FormKind,
    username: String,
    email: String,
    password: String,
    focus: usize,
    status: FormStatus,
}

impl AuthForm {
    pub fn new(kind: FormKind) -> Self {
        Self {
            kind,
            username: String::new(),
            email: String::new(),
            password: String::new(),
            focus: 0,
            status: FormStatus::Idle,
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn status(&self) -> &FormStatus {
        &self.status
    }

    pub fn focused(&self) -> Field {
        self.kind.fields()[self.focus]
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Username => &self.username,
            Field::Email => &self.email,
            Field::Password => &self.password,
        }
    }

    fn value_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Username => &mut self.username,
            Field::Email => &mut self.email,
            Field::Password => &mut self.password,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.kind.fields().len();
    }

    pub fn focus_prev(&mut self) {
        let len = self.kind.fields().len();
        self.focus = (self.focus + len - 1) % len;
    }

    pub fn input(&mut self, c: char) {
        if self.status == FormStatus::Submitting || c.is_control() {
            return;
        }
        let field = self.focused();
        self.value_mut(field).push(c);
    }

    pub fn backspace(&mut self) {
        if self.status == FormStatus::Submitting {
            return;
        }
        let field = self.focused();
        self.value_mut(field).pop();
    }

    /// Validate and start a submission. Returns `None` while a submission is
    /// already in flight or when a field is empty.
    pub fn submit(&mut self) -> Option<AuthRequest> {
        if self.status == FormStatus::Submitting {
            return None;
        }
        if self.kind.fields().iter().any(|&f| self.value(f).trim().is_empty()) {
            self.status = FormStatus::Failed("All fields are required.".to_string());
            return None;
        }

        self.status = FormStatus::Submitting;
        let email = self.email.trim().to_string();
        Some(match self.kind {
            FormKind::Login => AuthRequest::Login(Credentials {
                email,
                password: self.password.clone(),
            }),
            FormKind::Register => AuthRequest::Register(Registration {
                email,
                username: self.username.trim().to_string(),
                password: self.password.clone(),
            }),
        })
    }

    /// Finish a submission. A token in the response signs the session in;
    /// anything else leaves it untouched and shows the error.
    pub fn complete(&mut self, session: &Session, result: Result<TokenResponse, String>) {
        let token = match result {
            Ok(TokenResponse { token: Some(token) }) if !token.is_empty() => token,
            Ok(_) => {
                tracing::warn!(form = ?self.kind, "auth response carried no token");
                self.status = FormStatus::Failed(self.kind.failure_fallback().to_string());
                return;
            }
            Err(message) => {
                let message = if message.trim().is_empty() {
                    self.kind.failure_fallback().to_string()
                } else {
                    message
                };
                self.status = FormStatus::Failed(message);
                return;
            }
        };

        if let Err(e) = session.sign_in(token) {
            tracing::warn!(error = %e, "could not persist session token");
        }
        self.password.clear();
        self.status = FormStatus::Succeeded(self.kind.success_message());
        tracing::info!(form = ?self.kind, "signed in");
    }

    /// Back to a blank form
    pub fn reset(&mut self) {
        *self = Self::new(self.kind);
    }
}
