use serde::{Deserialize, Serialize};

use crate::database::Table;

pub mod endpoints;
pub use endpoints::*;

/// The pages reachable from the admin sidebar.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminPage {
    Dashboard,
    Marketing,
    Team,
    Testimonials,
    Videos,
}

impl AdminPage {
    pub const MENU: [AdminPage; 5] = [
        AdminPage::Dashboard,
        AdminPage::Marketing,
        AdminPage::Team,
        AdminPage::Testimonials,
        AdminPage::Videos,
    ];

    pub fn path(self) -> &'static str {
        match self {
            AdminPage::Dashboard => "/admin/dashboard",
            AdminPage::Marketing => "/admin/marketing",
            AdminPage::Team => "/admin/team",
            AdminPage::Testimonials => "/admin/testimonials",
            AdminPage::Videos => "/admin/videos",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AdminPage::Dashboard => "Dashboard",
            AdminPage::Marketing => "Marketing",
            AdminPage::Team => "Team",
            AdminPage::Testimonials => "Testimonials",
            AdminPage::Videos => "Videos",
        }
    }

    pub fn for_table(table: Table) -> AdminPage {
        match table {
            Table::MarketingCampaigns => AdminPage::Marketing,
            Table::TeamMembers => AdminPage::Team,
            Table::Testimonials => AdminPage::Testimonials,
            Table::Videos => AdminPage::Videos,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MenuItem {
    pub page: AdminPage,
    pub label: &'static str,
    pub path: &'static str,
}

pub fn menu() -> Vec<MenuItem> {
    AdminPage::MENU
        .iter()
        .map(|&page| MenuItem {
            page,
            label: page.label(),
            path: page.path(),
        })
        .collect()
}
