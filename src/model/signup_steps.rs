/// Screens a signup step can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    About,
    CredsConfirm,
    CredsComplete,
    CredsPermission,
    DesignType,
    DesignTypeWithStore,
    DesignTypeWithAtomicStore,
    Domains,
    GetDotBlogPlans,
    Plans,
    PlansAtomicStore,
    PlansWithoutFreePlan,
    Site,
    RebrandCitiesWelcome,
    RewindAdd,
    RewindComplete,
    RewindConfirm,
    RewindForm,
    SiteOrDomain,
    SitePicker,
    SiteTitle,
    Survey,
    ThemeSelection,
    UserSignup,
    /// Only registered in development builds of the flow.
    Test,
}

impl StepKind {
    pub fn label(&self) -> &'static str {
        match self {
            StepKind::About => "about",
            StepKind::CredsConfirm => "creds confirm",
            StepKind::CredsComplete => "creds complete",
            StepKind::CredsPermission => "creds permission",
            StepKind::DesignType => "design type",
            StepKind::DesignTypeWithStore => "design type (store)",
            StepKind::DesignTypeWithAtomicStore => "design type (atomic store)",
            StepKind::Domains => "domains",
            StepKind::GetDotBlogPlans => "dot-blog plans",
            StepKind::Plans => "plans",
            StepKind::PlansAtomicStore => "plans (atomic store)",
            StepKind::PlansWithoutFreePlan => "plans (no free plan)",
            StepKind::Site => "site",
            StepKind::RebrandCitiesWelcome => "rebrand cities welcome",
            StepKind::RewindAdd => "rewind add",
            StepKind::RewindComplete => "rewind complete",
            StepKind::RewindConfirm => "rewind confirm",
            StepKind::RewindForm => "rewind form",
            StepKind::SiteOrDomain => "site or domain",
            StepKind::SitePicker => "site picker",
            StepKind::SiteTitle => "site title",
            StepKind::Survey => "survey",
            StepKind::ThemeSelection => "theme selection",
            StepKind::UserSignup => "user signup",
            StepKind::Test => "test",
        }
    }
}

const STEPS: &[(&str, StepKind)] = &[
    ("about", StepKind::About),
    ("creds-confirm", StepKind::CredsConfirm),
    ("creds-complete", StepKind::CredsComplete),
    ("creds-permission", StepKind::CredsPermission),
    ("design-type", StepKind::DesignType),
    ("design-type-with-store", StepKind::DesignTypeWithStore),
    ("design-type-with-store-nux", StepKind::DesignTypeWithAtomicStore),
    ("domains", StepKind::Domains),
    ("domain-only", StepKind::Domains),
    ("domains-theme-preselected", StepKind::Domains),
    ("jetpack-user", StepKind::UserSignup),
    ("get-dot-blog-plans", StepKind::GetDotBlogPlans),
    ("get-dot-blog-themes", StepKind::ThemeSelection),
    ("plans", StepKind::Plans),
    ("plans-store-nux", StepKind::PlansAtomicStore),
    ("plans-site-selected", StepKind::PlansWithoutFreePlan),
    ("site", StepKind::Site),
    ("rebrand-cities-welcome", StepKind::RebrandCitiesWelcome),
    ("rewind-add", StepKind::RewindAdd),
    ("rewind-complete", StepKind::RewindComplete),
    ("rewind-confirm", StepKind::RewindConfirm),
    ("rewind-form", StepKind::RewindForm),
    ("site-or-domain", StepKind::SiteOrDomain),
    ("site-picker", StepKind::SitePicker),
    ("site-title", StepKind::SiteTitle),
    ("survey", StepKind::Survey),
    ("survey-user", StepKind::UserSignup),
    ("test", StepKind::Test),
    ("themes", StepKind::ThemeSelection),
    ("website-themes", StepKind::ThemeSelection),
    ("blog-themes", StepKind::ThemeSelection),
    ("portfolio-themes", StepKind::ThemeSelection),
    ("themes-site-selected", StepKind::ThemeSelection),
    ("user", StepKind::UserSignup),
    ("oauth2-user", StepKind::UserSignup),
];

/// Step name → screen lookup for the signup wizard.
#[derive(Debug, Clone)]
pub struct StepRegistry {
    development: bool,
}

impl StepRegistry {
    pub fn new(development: bool) -> Self {
        Self { development }
    }

    pub fn lookup(&self, name: &str) -> Option<StepKind> {
        self.entries()
            .find(|(step, _)| *step == name)
            .map(|(_, kind)| kind)
    }

    /// Every step name that renders `kind`, in registry order.
    pub fn names_for(&self, kind: StepKind) -> Vec<&'static str> {
        self.entries()
            .filter(|(_, k)| *k == kind)
            .map(|(name, _)| name)
            .collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&'static str, StepKind)> + '_ {
        STEPS
            .iter()
            .copied()
            .filter(move |(_, kind)| self.development || *kind != StepKind::Test)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_aliases_to_shared_screens() {
        let registry = StepRegistry::new(false);

        assert_eq!(registry.lookup("domain-only"), Some(StepKind::Domains));
        assert_eq!(registry.lookup("survey-user"), Some(StepKind::UserSignup));
        assert_eq!(
            registry.lookup("plans-store-nux"),
            Some(StepKind::PlansAtomicStore)
        );
        assert_eq!(registry.lookup("no-such-step"), None);
    }

    #[test]
    fn test_step_only_in_development() {
        assert_eq!(StepRegistry::new(false).lookup("test"), None);
        assert_eq!(
            StepRegistry::new(true).lookup("test"),
            Some(StepKind::Test)
        );
    }

    #[test]
    fn lists_names_per_screen() {
        let registry = StepRegistry::new(false);

        assert_eq!(
            registry.names_for(StepKind::Domains),
            vec!["domains", "domain-only", "domains-theme-preselected"]
        );
        assert_eq!(registry.names_for(StepKind::UserSignup).len(), 4);
        assert_eq!(registry.entries().count(), STEPS.len() - 1);
    }

    #[test]
    fn step_names_are_unique() {
        let registry = StepRegistry::new(true);
        let mut names: Vec<_> = registry.entries().map(|(name, _)| name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), STEPS.len());
    }
}
