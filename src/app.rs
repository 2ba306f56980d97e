use std::collections::VecDeque;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};

use crate::model::config::AppConfig;
use crate::model::domain_search::{
    AvailabilityNotice, DomainSearchResults, MappingOffer, SuggestionRow, UnavailableOffer,
    UnavailableReason,
};
use crate::model::installer::{
    InstallAction, InstallerState, PluginStatus, RequiredPluginsInstaller, SetupSnapshot,
};
use crate::model::plugin::{Catalog, InstalledPlugin, PluginSlug, SiteId};
use crate::model::screen::Screen;
use crate::model::signup_steps::StepRegistry;
use crate::model::trigger::Reevaluation;
use crate::msg::Msg;
use crate::service::SetupService;

const MAX_NOTIFICATIONS: usize = 8;
const PULSE_FRAMES: [&str; 4] = ["◐", "◓", "◑", "◒"];

pub struct App {
    pub screen: Screen,
    pub config: AppConfig,
    pub should_quit: bool,
    pub notifications: VecDeque<String>,
    service: Box<dyn SetupService>,
    installer: RequiredPluginsInstaller,
    installer_state: InstallerState,
    reevaluation: Reevaluation,
    site: Option<SiteId>,
    installed: Option<Vec<InstalledPlugin>>,
    catalog: Catalog,
    unlisted: Vec<PluginSlug>,
    setup_confirmed: bool,
    step_registry: StepRegistry,
    domain_results: DomainSearchResults,
    tick: usize,
}

impl App {
    pub fn new(config: AppConfig, service: Box<dyn SetupService>) -> Result<Self> {
        let installer = config.installer()?;
        let step_registry = StepRegistry::new(config.is_development());
        let domain_results = DomainSearchResults::build(&config.domains);

        let mut app = Self {
            screen: Screen::Setup,
            config,
            should_quit: false,
            notifications: VecDeque::new(),
            service,
            installer,
            installer_state: InstallerState::default(),
            reevaluation: Reevaluation::default(),
            site: None,
            installed: None,
            catalog: Catalog::new(),
            unlisted: Vec::new(),
            setup_confirmed: false,
            step_registry,
            domain_results,
            tick: 0,
        };

        app.activate()?;
        Ok(app)
    }

    /// Kick off site resolution and catalog fetches for the setup screen.
    fn activate(&mut self) -> Result<()> {
        self.service.resolve_site()?;
        self.fetch_missing_catalog_entries()?;
        Ok(())
    }

    fn fetch_missing_catalog_entries(&mut self) -> Result<()> {
        self.unlisted.clear();
        for slug in self.installer.missing_catalog_entries(&self.catalog) {
            self.service.fetch_catalog_entry(&slug)?;
        }
        Ok(())
    }

    pub fn progress(&self) -> f64 {
        self.installer_state.progress
    }

    pub fn is_setup_finished(&self) -> bool {
        self.installer_state.finished
    }

    // ── MVU: Update ──────────────────────────────────────────────

    pub fn update(&mut self, msg: Msg) -> Result<()> {
        match msg {
            Msg::Key(key) => self.handle_key(key)?,
            Msg::Resize(_, _) => {}
            Msg::SiteResolved(site) => {
                tracing::info!("resolved {site}");
                self.site = Some(site);
                self.service.load_installed_plugins(site)?;
                self.advance_installer()?;
            }
            Msg::InstalledPluginsLoaded(site, plugins) => {
                if self.site != Some(site) {
                    tracing::debug!("ignoring plugin list for {site}");
                    return Ok(());
                }
                self.installed = Some(plugins);
                self.advance_installer()?;
            }
            Msg::CatalogEntryFetched(entry) => {
                self.catalog.insert(entry);
                self.advance_installer()?;
            }
            Msg::CatalogEntryMissing(slug) => {
                tracing::warn!("no catalog entry for {slug}");
                self.push_notification(format!("plugin directory has no entry for {slug}"));
                if !self.unlisted.contains(&slug) {
                    self.unlisted.push(slug);
                }
            }
            Msg::InstallFailed { site, slug, reason } => {
                tracing::warn!("{site}: install of {slug} failed: {reason}");
                self.push_notification(format!("{slug}: {reason}"));
                if self.installer_state.mark_failed(&slug) {
                    self.reevaluation.force();
                    self.advance_installer()?;
                }
            }
            Msg::SetupMarkedFinished(site) => {
                if !self.setup_confirmed {
                    self.setup_confirmed = true;
                    self.push_notification(format!("{site}: store setup complete"));
                }
            }
            Msg::Tick => self.tick = self.tick.wrapping_add(1),
            Msg::Quit => self.should_quit = true,
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => self.screen = self.screen.cycle(1),
            KeyCode::BackTab => self.screen = self.screen.cycle(-1),
            KeyCode::Char('r') => self.retry()?,
            _ => {}
        }
        Ok(())
    }

    /// Ask again for catalog entries that were missing and rescan. A pending
    /// install is released so it gets requested again.
    fn retry(&mut self) -> Result<()> {
        self.push_notification("retrying setup".to_string());
        if let Some(slug) = self.installer_state.clear_stall() {
            tracing::info!("retrying stalled install of {slug}");
        }
        if let Some(slug) = self.installer_state.installing.clone()
            && self.installer_state.mark_failed(&slug)
        {
            tracing::info!("releasing pending install of {slug}");
        }
        self.fetch_missing_catalog_entries()?;
        if let Some(site) = self.site {
            self.service.load_installed_plugins(site)?;
        }
        self.reevaluation.force();
        self.advance_installer()
    }

    fn advance_installer(&mut self) -> Result<()> {
        let snapshot = SetupSnapshot {
            site: self.site,
            installed: self.installed.as_deref(),
            catalog: &self.catalog,
        };

        if !self.reevaluation.observe(&snapshot) {
            return Ok(());
        }

        let (action, next) = self.installer.evaluate(&snapshot, &self.installer_state);
        self.installer_state = next;

        match action {
            InstallAction::None => {}
            InstallAction::Install { site, entry } => {
                tracing::debug!("{site}: {} from {}", entry.slug, entry.download_url);
                self.push_notification(format!("installing {} {}", entry.name, entry.version));
                self.service.request_install(site, &entry)?;
            }
            InstallAction::FinishSetup { site } => {
                self.service.mark_setup_finished(site, true)?;
            }
            InstallAction::Stall { slug, attempts } => {
                self.push_notification(format!(
                    "{slug} failed {attempts} times, press r to retry"
                ));
            }
        }

        Ok(())
    }

    fn push_notification(&mut self, message: String) {
        self.notifications.push_back(message);
        while self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
    }

    // ── MVU: View ────────────────────────────────────────────────

    pub fn view(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // tab bar
                Constraint::Min(1),    // body
                Constraint::Length(1), // status bar
            ])
            .split(frame.area());

        self.render_tab_bar(frame, chunks[0]);

        match self.screen {
            Screen::Setup => self.render_setup(frame, chunks[1]),
            Screen::Domains => self.render_domains(frame, chunks[1]),
            Screen::Steps => self.render_steps(frame, chunks[1]),
        }

        self.render_status_bar(frame, chunks[2]);
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let mut spans: Vec<Span> = Screen::all()
            .iter()
            .map(|screen| {
                let style = if *screen == self.screen {
                    Style::default()
                        .bg(Color::Rgb(30, 30, 45))
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().bg(Color::Rgb(18, 18, 28)).fg(Color::Gray)
                };
                Span::styled(format!(" {} ", screen.label()), style)
            })
            .collect();

        spans.push(Span::styled(
            "  Tab/Shift+Tab: Screens  r: Retry  q: Quit ",
            Style::default()
                .bg(Color::Rgb(20, 20, 30))
                .fg(Color::DarkGray),
        ));

        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Rgb(20, 20, 30))),
            area,
        );
    }

    fn render_setup(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Setting up your store ")
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // subtitle
                Constraint::Length(1), // gauge
                Constraint::Length(1),
                Constraint::Length(self.installer.required().len() as u16),
                Constraint::Length(1),
                Constraint::Min(0), // notifications
            ])
            .split(inner);

        let subtitle = if self.installer_state.finished {
            "All set. Your store is ready.".to_string()
        } else {
            let pulse = PULSE_FRAMES[self.tick % PULSE_FRAMES.len()];
            format!("{pulse} Give us a minute and we'll move right along.")
        };
        frame.render_widget(
            Paragraph::new(subtitle).style(Style::default().fg(Color::Gray)),
            rows[0],
        );

        // Retries keep adding to progress, the gauge stops at full.
        let shown = self.installer_state.progress.clamp(0.0, 100.0);
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Magenta).bg(Color::Rgb(20, 20, 30)))
            .ratio(shown / 100.0)
            .label(format!("{shown:.0}%"));
        frame.render_widget(gauge, rows[1]);

        let plugin_lines: Vec<Line> = self
            .installer
            .plugin_statuses(self.installed.as_deref(), &self.installer_state)
            .into_iter()
            .map(|(slug, status)| {
                let color = match status {
                    PluginStatus::Installed => Color::Green,
                    PluginStatus::Installing => Color::Cyan,
                    PluginStatus::Stalled => Color::Red,
                    PluginStatus::Waiting if self.unlisted.contains(&slug) => Color::Yellow,
                    PluginStatus::Waiting => Color::DarkGray,
                };
                let present = self
                    .installed
                    .as_deref()
                    .and_then(|list| list.iter().find(|plugin| plugin.slug == slug));
                let name = match (present, self.catalog.get(&slug)) {
                    (Some(plugin), _) => plugin.name.clone(),
                    (None, Some(entry)) => entry.name.clone(),
                    (None, None) => slug.to_string(),
                };
                let detail = match present {
                    Some(plugin) if plugin.active => format!("  {}", plugin.version),
                    Some(plugin) => format!("  {} (inactive)", plugin.version),
                    None => String::new(),
                };
                Line::from(vec![
                    Span::styled(format!("  {:<12}", status.label()), Style::default().fg(color)),
                    Span::raw(name),
                    Span::styled(detail, Style::default().fg(Color::DarkGray)),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(plugin_lines), rows[3]);

        let notes: Vec<Line> = self
            .notifications
            .iter()
            .map(|note| {
                Line::from(Span::styled(
                    format!("  {note}"),
                    Style::default().fg(Color::DarkGray),
                ))
            })
            .collect();
        frame.render_widget(Paragraph::new(notes), rows[5]);
    }

    fn render_domains(&self, frame: &mut Frame, area: Rect) {
        let results = &self.domain_results;
        let mut lines = Vec::new();

        match &results.availability.notice {
            Some(AvailabilityNotice::Available { domain }) => lines.push(Line::from(Span::styled(
                format!("{domain} is available!"),
                Style::default().fg(Color::Green),
            ))),
            Some(AvailabilityNotice::TransferCard { domain, reason }) => {
                lines.push(Line::from(Span::styled(
                    unavailable_text(domain, reason),
                    Style::default().fg(Color::Yellow),
                )));
                lines.push(Line::from("Yes, I own this domain (transfer it in)"));
            }
            Some(AvailabilityNotice::Unavailable {
                domain,
                reason,
                offer,
            }) => {
                let mut text = unavailable_text(domain, reason);
                if let Some(offer) = offer {
                    text.push_str(&format!(" {}", offer_text(domain, offer)));
                }
                lines.push(Line::from(Span::styled(
                    text,
                    Style::default().fg(Color::Yellow),
                )));
            }
            None => {}
        }

        if let Some(featured) = &results.availability.featured {
            lines.push(suggestion_line(&featured.domain_name, featured.cost.as_deref()));
        }
        lines.push(Line::from(""));

        for row in &results.rows {
            lines.push(match row {
                SuggestionRow::Placeholder => Line::from(Span::styled(
                    "  ░░░░░░░░░░░░░░░░",
                    Style::default().fg(Color::DarkGray),
                )),
                SuggestionRow::Registration {
                    suggestion,
                    position,
                    fetch_algo,
                    ..
                } => {
                    let mut line =
                        suggestion_line(&suggestion.domain_name, suggestion.cost.as_deref());
                    line.spans.insert(
                        0,
                        Span::styled(format!("{:>3}.", position + 1), Style::default().fg(Color::DarkGray)),
                    );
                    line.spans.push(Span::styled(
                        format!("  [{fetch_algo}]"),
                        Style::default().fg(Color::DarkGray),
                    ));
                    line
                }
            });
        }

        match results.unavailable_offer {
            Some(UnavailableOffer::Mapping) => {
                lines.push(Line::from("  Already own a domain? Map it to your site."));
            }
            Some(UnavailableOffer::Transfer) => {
                lines.push(Line::from("  Already own a domain? Transfer it here."));
            }
            None => {}
        }

        let title_style = if results.availability.is_available {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Gray)
        };
        let block = Block::default()
            .title(Span::styled(
                format!(" Domains: {} ", self.config.domains.last_domain_searched),
                title_style,
            ))
            .borders(Borders::ALL);
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_steps(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![Line::from(Span::styled(
            "Configured flow",
            Style::default().add_modifier(Modifier::BOLD),
        ))];

        for name in &self.config.signup.flow {
            let line = match self.step_registry.lookup(name) {
                Some(kind) => Line::from(vec![
                    Span::styled(format!("  {name:<28}"), Style::default().fg(Color::Cyan)),
                    Span::raw(kind.label()),
                ]),
                None => Line::from(Span::styled(
                    format!("  {name:<28}unknown step"),
                    Style::default().fg(Color::Red),
                )),
            };
            lines.push(line);
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Registered steps",
            Style::default().add_modifier(Modifier::BOLD),
        )));

        let mut seen = Vec::new();
        for (_, kind) in self.step_registry.entries() {
            if seen.contains(&kind) {
                continue;
            }
            seen.push(kind);
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<28}", kind.label()), Style::default().fg(Color::Gray)),
                Span::styled(
                    self.step_registry.names_for(kind).join(", "),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
        }

        let block = Block::default().title(" Signup steps ").borders(Borders::ALL);
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let screen_span = Span::styled(
            format!(" {} ", self.screen.label()),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        );

        let site = self
            .site
            .map(|site| site.to_string())
            .unwrap_or_else(|| "resolving site".to_string());
        let required = self.installer.required().len();
        let installed = self
            .installer
            .plugin_statuses(self.installed.as_deref(), &self.installer_state)
            .iter()
            .filter(|(_, status)| *status == PluginStatus::Installed)
            .count();
        let state = if self.setup_confirmed {
            " | done"
        } else if self.installer_state.installing.is_some() {
            " | installing"
        } else {
            ""
        };

        let info = Span::styled(
            format!(" {site}  {installed}/{required} required plugins{state} "),
            Style::default().fg(Color::Gray).bg(Color::DarkGray),
        );

        let status = Paragraph::new(Line::from(vec![screen_span, info]))
            .style(Style::default().bg(Color::DarkGray));
        frame.render_widget(status, area);
    }
}

fn unavailable_text(domain: &str, reason: &UnavailableReason) -> String {
    match reason {
        UnavailableReason::Taken => format!("{domain} is taken."),
        UnavailableReason::TldNotOffered { tld } => format!(".{tld} domains are not offered."),
    }
}

fn offer_text(domain: &str, offer: &MappingOffer) -> String {
    match offer {
        MappingOffer::Free => format!("If you purchased {domain} elsewhere, you can map it for free."),
        MappingOffer::Priced(cost) => {
            format!("If you purchased {domain} elsewhere, you can map it for {cost}.")
        }
        MappingOffer::WithPremium => {
            format!("If you purchased {domain} elsewhere, you can map it with a Premium plan.")
        }
    }
}

fn suggestion_line(domain: &str, cost: Option<&str>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {domain:<32}"), Style::default().fg(Color::Cyan)),
        Span::styled(
            cost.unwrap_or("").to_string(),
            Style::default().fg(Color::Gray),
        ),
    ])
}
