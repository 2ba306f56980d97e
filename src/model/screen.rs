/// Top-level screens, cycled with Tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// Required plugin installation progress.
    #[default]
    Setup,
    /// Domain search results.
    Domains,
    /// Signup step registry.
    Steps,
}

impl Screen {
    const ALL: [Screen; 3] = [Screen::Setup, Screen::Domains, Screen::Steps];

    pub fn label(&self) -> &'static str {
        match self {
            Screen::Setup => "SETUP",
            Screen::Domains => "DOMAINS",
            Screen::Steps => "STEPS",
        }
    }

    pub fn cycle(self, delta: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0) as isize;
        Self::ALL[(idx + delta).rem_euclid(len) as usize]
    }

    pub fn all() -> &'static [Screen] {
        &Self::ALL
    }
}
