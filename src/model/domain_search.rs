use serde::Deserialize;

const STORE_DESIGN_TYPE: &str = "store";
const WPCOM_SUFFIX: &str = ".wordpress.com";

/// Availability reported for the last searched domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainStatus {
    Available,
    Mappable,
    Mapped,
    TldNotSupported,
    Transferrable,
    Unknown,
    NotRegistrable,
}

impl DomainStatus {
    /// Statuses for which an "already own it?" path is offered.
    fn offers_unavailable_path(&self) -> bool {
        matches!(
            self,
            DomainStatus::Transferrable
                | DomainStatus::Mappable
                | DomainStatus::Mapped
                | DomainStatus::TldNotSupported
                | DomainStatus::Unknown
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DomainSuggestion {
    pub domain_name: String,
    #[serde(default)]
    pub cost: Option<String>,
    #[serde(default)]
    pub is_placeholder: bool,
}

/// Inputs of one render of the search results.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DomainSearchProps {
    pub last_domain_searched: String,
    pub last_domain_status: Option<DomainStatus>,
    pub last_domain_is_transferrable: bool,
    pub available_domain: Option<DomainSuggestion>,
    pub suggestions: Option<Vec<DomainSuggestion>>,
    pub is_loading_suggestions: bool,
    pub placeholder_quantity: usize,
    pub offer_unavailable_option: bool,
    pub domains_with_plans_only: bool,
    pub is_signup_step: bool,
    pub transfer_in_allowed: bool,
    pub site_on_paid_plan: bool,
    pub next_domain_free: bool,
    pub design_type: Option<String>,
    /// Display price of the domain mapping product, if it is sold at all.
    pub mapping_cost: Option<String>,
    pub fetch_algo: String,
}

impl DomainSearchProps {
    fn is_store(&self) -> bool {
        self.design_type.as_deref() == Some(STORE_DESIGN_TYPE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingOffer {
    Free,
    Priced(String),
    WithPremium,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnavailableReason {
    Taken,
    TldNotOffered { tld: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityNotice {
    Available {
        domain: String,
    },
    TransferCard {
        domain: String,
        reason: UnavailableReason,
    },
    Unavailable {
        domain: String,
        reason: UnavailableReason,
        offer: Option<MappingOffer>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    pub is_available: bool,
    pub notice: Option<AvailabilityNotice>,
    pub featured: Option<DomainSuggestion>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionRow {
    Placeholder,
    Registration {
        suggestion: DomainSuggestion,
        position: usize,
        fetch_algo: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableOffer {
    Mapping,
    Transfer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSearchResults {
    pub availability: Availability,
    pub rows: Vec<SuggestionRow>,
    pub unavailable_offer: Option<UnavailableOffer>,
}

impl DomainSearchResults {
    pub fn build(props: &DomainSearchProps) -> Self {
        let (rows, unavailable_offer) = suggestion_rows(props);
        Self {
            availability: availability(props),
            rows,
            unavailable_offer,
        }
    }
}

/// Top-level domain of `domain`, without the dot. Empty when there is none.
pub fn tld_of(domain: &str) -> &str {
    domain.rsplit_once('.').map(|(_, tld)| tld).unwrap_or("")
}

fn availability(props: &DomainSearchProps) -> Availability {
    let domain = props
        .available_domain
        .as_ref()
        .map(|d| d.domain_name.clone())
        .unwrap_or_else(|| props.last_domain_searched.clone());

    if let Some(available) = props.available_domain.as_ref() {
        return Availability {
            is_available: true,
            notice: Some(AvailabilityNotice::Available { domain }),
            featured: Some(available.clone()),
        };
    }

    let unavailable = Availability {
        is_available: false,
        notice: None,
        featured: None,
    };

    let has_suggestions = props.suggestions.as_ref().is_some_and(|s| !s.is_empty());
    let Some(status) = props.last_domain_status.filter(|s| s.offers_unavailable_path()) else {
        return unavailable;
    };
    let Some(mapping_cost) = props.mapping_cost.as_ref() else {
        return unavailable;
    };
    if !has_suggestions || !props.offer_unavailable_option {
        return unavailable;
    }

    let offer = if props.is_store() {
        None
    } else if props.next_domain_free {
        Some(MappingOffer::Free)
    } else if !props.domains_with_plans_only || props.site_on_paid_plan {
        Some(MappingOffer::Priced(mapping_cost.clone()))
    } else {
        Some(MappingOffer::WithPremium)
    };

    let reason = match status {
        DomainStatus::TldNotSupported | DomainStatus::Unknown => UnavailableReason::TldNotOffered {
            tld: tld_of(&domain).to_string(),
        },
        _ => UnavailableReason::Taken,
    };

    let notice = if !props.is_store()
        && props.transfer_in_allowed
        && !props.is_signup_step
        && props.last_domain_is_transferrable
    {
        Some(AvailabilityNotice::TransferCard { domain, reason })
    } else if status != DomainStatus::Mapped {
        Some(AvailabilityNotice::Unavailable {
            domain,
            reason,
            offer,
        })
    } else {
        None
    };

    Availability { notice, ..unavailable }
}

fn suggestion_rows(props: &DomainSearchProps) -> (Vec<SuggestionRow>, Option<UnavailableOffer>) {
    let suggestions = match props.suggestions.as_ref() {
        Some(suggestions) if !props.is_loading_suggestions => suggestions,
        _ => {
            return (
                vec![SuggestionRow::Placeholder; props.placeholder_quantity],
                None,
            );
        }
    };

    let rows = suggestions
        .iter()
        .enumerate()
        .map(|(position, suggestion)| {
            if suggestion.is_placeholder {
                return SuggestionRow::Placeholder;
            }

            let fetch_algo = if suggestion.domain_name.ends_with(WPCOM_SUFFIX) {
                "wpcom".to_string()
            } else {
                props.fetch_algo.clone()
            };

            SuggestionRow::Registration {
                suggestion: suggestion.clone(),
                position,
                fetch_algo,
            }
        })
        .collect();

    let offer = if props.offer_unavailable_option && !props.is_store() {
        if props.transfer_in_allowed && !props.is_signup_step {
            Some(UnavailableOffer::Transfer)
        } else {
            Some(UnavailableOffer::Mapping)
        }
    } else {
        None
    };

    (rows, offer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(name: &str) -> DomainSuggestion {
        DomainSuggestion {
            domain_name: name.to_string(),
            cost: Some("$18".to_string()),
            is_placeholder: false,
        }
    }

    fn taken_props() -> DomainSearchProps {
        DomainSearchProps {
            last_domain_searched: "shop.example".to_string(),
            last_domain_status: Some(DomainStatus::Mappable),
            suggestions: Some(vec![suggestion("shopexample.com")]),
            placeholder_quantity: 3,
            offer_unavailable_option: true,
            mapping_cost: Some("$13".to_string()),
            fetch_algo: "algo_v2".to_string(),
            ..Default::default()
        }
    }

    fn notice(props: &DomainSearchProps) -> Option<AvailabilityNotice> {
        DomainSearchResults::build(props).availability.notice
    }

    #[test]
    fn available_domain_is_featured() {
        let props = DomainSearchProps {
            last_domain_searched: "ignored.example".to_string(),
            available_domain: Some(suggestion("mystore.com")),
            ..taken_props()
        };

        let results = DomainSearchResults::build(&props);
        assert!(results.availability.is_available);
        assert_eq!(
            results.availability.notice,
            Some(AvailabilityNotice::Available {
                domain: "mystore.com".to_string()
            })
        );
        assert_eq!(results.availability.featured, Some(suggestion("mystore.com")));
    }

    #[test]
    fn mapping_offer_depends_on_cart_and_plan() {
        let priced = taken_props();
        assert_eq!(
            notice(&priced),
            Some(AvailabilityNotice::Unavailable {
                domain: "shop.example".to_string(),
                reason: UnavailableReason::Taken,
                offer: Some(MappingOffer::Priced("$13".to_string())),
            })
        );

        let free = DomainSearchProps {
            next_domain_free: true,
            ..taken_props()
        };
        assert!(matches!(
            notice(&free),
            Some(AvailabilityNotice::Unavailable { offer: Some(MappingOffer::Free), .. })
        ));

        let premium = DomainSearchProps {
            domains_with_plans_only: true,
            ..taken_props()
        };
        assert!(matches!(
            notice(&premium),
            Some(AvailabilityNotice::Unavailable { offer: Some(MappingOffer::WithPremium), .. })
        ));

        let store = DomainSearchProps {
            design_type: Some("store".to_string()),
            ..taken_props()
        };
        assert!(matches!(
            notice(&store),
            Some(AvailabilityNotice::Unavailable { offer: None, .. })
        ));
    }

    #[test]
    fn unsupported_tld_reports_the_tld() {
        let props = DomainSearchProps {
            last_domain_status: Some(DomainStatus::TldNotSupported),
            ..taken_props()
        };

        assert!(matches!(
            notice(&props),
            Some(AvailabilityNotice::Unavailable {
                reason: UnavailableReason::TldNotOffered { tld },
                ..
            }) if tld == "example"
        ));
    }

    #[test]
    fn transferrable_domain_gets_transfer_card_outside_signup() {
        let props = DomainSearchProps {
            last_domain_status: Some(DomainStatus::Transferrable),
            last_domain_is_transferrable: true,
            transfer_in_allowed: true,
            ..taken_props()
        };
        assert!(matches!(
            notice(&props),
            Some(AvailabilityNotice::TransferCard { .. })
        ));

        let signup = DomainSearchProps {
            is_signup_step: true,
            ..props
        };
        assert!(matches!(
            notice(&signup),
            Some(AvailabilityNotice::Unavailable { .. })
        ));
    }

    #[test]
    fn no_notice_without_unavailable_option_or_when_mapped() {
        let hidden = DomainSearchProps {
            offer_unavailable_option: false,
            ..taken_props()
        };
        assert_eq!(notice(&hidden), None);

        let mapped = DomainSearchProps {
            last_domain_status: Some(DomainStatus::Mapped),
            ..taken_props()
        };
        assert_eq!(notice(&mapped), None);

        let not_sold = DomainSearchProps {
            mapping_cost: None,
            ..taken_props()
        };
        assert_eq!(notice(&not_sold), None);
    }

    #[test]
    fn placeholders_while_loading() {
        let props = DomainSearchProps {
            is_loading_suggestions: true,
            ..taken_props()
        };

        let results = DomainSearchResults::build(&props);
        assert_eq!(results.rows, vec![SuggestionRow::Placeholder; 3]);
        assert_eq!(results.unavailable_offer, None);
    }

    #[test]
    fn rows_carry_position_and_fetch_algo() {
        let mut placeholder = suggestion("pending");
        placeholder.is_placeholder = true;

        let props = DomainSearchProps {
            suggestions: Some(vec![
                suggestion("shopexample.com"),
                placeholder,
                suggestion("shopexample.wordpress.com"),
            ]),
            ..taken_props()
        };

        let results = DomainSearchResults::build(&props);
        assert_eq!(results.rows.len(), 3);
        assert_eq!(results.rows[1], SuggestionRow::Placeholder);
        assert!(matches!(
            &results.rows[0],
            SuggestionRow::Registration { fetch_algo, position: 0, .. } if fetch_algo == "algo_v2"
        ));
        assert!(matches!(
            &results.rows[2],
            SuggestionRow::Registration { fetch_algo, .. } if fetch_algo == "wpcom"
        ));
        assert_eq!(results.unavailable_offer, Some(UnavailableOffer::Mapping));
    }

    #[test]
    fn transfer_offer_replaces_mapping_outside_signup() {
        let props = DomainSearchProps {
            transfer_in_allowed: true,
            ..taken_props()
        };
        assert_eq!(
            DomainSearchResults::build(&props).unavailable_offer,
            Some(UnavailableOffer::Transfer)
        );

        let store = DomainSearchProps {
            transfer_in_allowed: true,
            design_type: Some("store".to_string()),
            ..taken_props()
        };
        assert_eq!(DomainSearchResults::build(&store).unavailable_offer, None);
    }

    #[test]
    fn tld_is_last_label() {
        assert_eq!(tld_of("shop.example.co.uk"), "uk");
        assert_eq!(tld_of("localhost"), "");
    }
}
