//! Precedence between local selection flags and the server profile.

use super::snapshot::{OnboardingType, Selection};

/// What the server profile says about onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerOnboarding {
    /// No profile record (new user) or the lookup failed.
    Missing,
    /// A record exists and explicitly reports onboarding as not completed.
    NotCompleted,
    Completed {
        onboarding_type: Option<OnboardingType>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionResolution {
    /// A confirmed local selection; mirror it into any tier missing it.
    Local(Selection),
    /// Adopted from the server; back-fill both tiers.
    FromServer(Selection),
    /// Stale local state was found and must be cleared; show the selector.
    Cleared,
    /// Nothing to adopt; show the selector.
    Unselected,
}

impl SelectionResolution {
    pub fn selection(&self) -> Option<Selection> {
        match self {
            Self::Local(selection) | Self::FromServer(selection) => Some(*selection),
            Self::Cleared | Self::Unselected => None,
        }
    }
}

/// Resolves which selection the wizard starts with.
///
/// Order: a server record explicitly not completed clears any local state;
/// otherwise a confirmed local selection (durable tier first) wins; otherwise a
/// completed server record is adopted, defaulting to `business` when it names
/// no type.
pub fn resolve_selection(
    durable: Option<Selection>,
    session: Option<Selection>,
    server: ServerOnboarding,
) -> SelectionResolution {
    let has_local = durable.is_some() || session.is_some();
    if server == ServerOnboarding::NotCompleted {
        return if has_local {
            SelectionResolution::Cleared
        } else {
            SelectionResolution::Unselected
        };
    }
    let confirmed_local = durable
        .filter(|selection| selection.confirmed)
        .or_else(|| session.filter(|selection| selection.confirmed));
    if let Some(selection) = confirmed_local {
        return SelectionResolution::Local(selection);
    }
    match server {
        ServerOnboarding::Completed { onboarding_type } => SelectionResolution::FromServer(
            Selection::confirmed(onboarding_type.unwrap_or(OnboardingType::Business)),
        ),
        _ => SelectionResolution::Unselected,
    }
}
