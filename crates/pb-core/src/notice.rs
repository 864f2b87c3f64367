//! Transient user-visible notifications and the two UI languages.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// How long the UI keeps a notice on screen.
pub const NOTICE_MS: u64 = 2400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Es,
    En,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::En => "en",
        }
    }
}

impl FromStr for Language {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "es" => Ok(Language::Es),
            "en" => Ok(Language::En),
            other => Err(AppError::validation(format!("unsupported language '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    Saved,
    Unsaved,
    Published,
    LoggedIn,
    LoggedOut,
    FillFields,
    PublishFailed,
    AutofillFailed,
    LoginFailed,
    FeedUnavailable,
}

impl Notice {
    pub fn message(&self, lang: Language) -> &'static str {
        use Language::{En, Es};
        match (self, lang) {
            (Notice::Saved, Es) => "Guardado",
            (Notice::Saved, En) => "Saved",
            (Notice::Unsaved, Es) => "Quitado de guardados",
            (Notice::Unsaved, En) => "Removed from saved",
            (Notice::Published, Es) => "Pin publicado",
            (Notice::Published, En) => "Pin published",
            (Notice::LoggedIn, Es) => "Sesión iniciada",
            (Notice::LoggedIn, En) => "Logged in",
            (Notice::LoggedOut, Es) => "Sesión cerrada",
            (Notice::LoggedOut, En) => "Logged out",
            (Notice::FillFields, Es) => "Completa todos los campos",
            (Notice::FillFields, En) => "Fill all fields",
            (Notice::PublishFailed, Es) => "No se pudo publicar, inténtalo de nuevo",
            (Notice::PublishFailed, En) => "Could not publish, try again",
            (Notice::AutofillFailed, Es) => "No se pudo analizar la imagen",
            (Notice::AutofillFailed, En) => "Could not analyze the image",
            (Notice::LoginFailed, Es) => "No se pudo iniciar sesión",
            (Notice::LoginFailed, En) => "Could not log in",
            (Notice::FeedUnavailable, Es) => "Sin conexión con el servidor, mostrando la demo",
            (Notice::FeedUnavailable, En) => "Server unreachable, showing demo data",
        }
    }
}
