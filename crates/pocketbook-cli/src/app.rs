//! Command implementations wiring the session lifecycle to the
//! terminal.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use tracing::warn;

use pocketbook_core::api::ApiClient;
use pocketbook_core::auth::{
    AccessGate, BootstrapOutcome, Bootstrapper, GateDecision, Route, SessionStore, TokenStorage,
};
use pocketbook_core::config::Config;
use pocketbook_core::models::{ExpenseFilters, LoginRequest, RegisterRequest};

pub struct App {
    config: Config,
    store: Arc<SessionStore>,
    client: ApiClient,
}

impl App {
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        let data_dir = Config::data_dir()?;
        let store = Arc::new(SessionStore::new(TokenStorage::new(data_dir)));
        let client = ApiClient::from_base_url(config.api_base_url.as_str(), store.clone())
            .context("Failed to build API client")?;
        Ok(Self {
            config,
            store,
            client,
        })
    }

    pub async fn status(&mut self) -> Result<()> {
        match Bootstrapper::new(self.store.clone()).run(&self.client).await {
            BootstrapOutcome::Restored(user) => {
                println!("Signed in as {} <{}> ({})", user.name, user.email, user.role);
            }
            BootstrapOutcome::Unauthenticated => {
                println!("Not signed in");
            }
        }
        Ok(())
    }

    pub async fn dashboard(&mut self) -> Result<()> {
        self.ensure_authenticated(Route::Dashboard).await?;

        let today = Local::now().date_naive();
        let (month, year) = (today.month(), today.year());

        let summary = self.client.dashboard_summary(month, year).await?;
        println!("Summary for {:02}/{}", month, year);
        println!("  Income:   {:>12.2}", summary.monthly_income);
        println!("  Expenses: {:>12.2}", summary.monthly_expenses);
        println!("  Savings:  {:>12.2}", summary.net_savings);

        let breakdown = self.client.category_breakdown(month, year).await?;
        if !breakdown.is_empty() {
            println!();
            println!("Spending by category:");
            for row in breakdown {
                println!(
                    "  {:<24} {:>12.2} ({:>5.1}%)",
                    row.category_name, row.amount, row.percentage
                );
            }
        }
        Ok(())
    }

    pub async fn expenses(&mut self) -> Result<()> {
        self.ensure_authenticated(Route::Expenses).await?;

        let page = self.client.expenses(&ExpenseFilters::default()).await?;
        if page.content.is_empty() {
            println!("No expenses recorded.");
            return Ok(());
        }
        for expense in &page.content {
            println!(
                "{}  {:>10.2}  {:<20}  {}",
                expense.expense_date, expense.amount, expense.category_name, expense.description
            );
        }
        println!();
        println!(
            "Page {}/{} ({} total)",
            page.number + 1,
            page.total_pages,
            page.total_elements
        );
        Ok(())
    }

    pub async fn profile(&mut self) -> Result<()> {
        self.ensure_authenticated(Route::Profile).await?;

        let user = self.client.me().await?;
        println!("Name:  {}", user.name);
        println!("Email: {}", user.email);
        println!("Role:  {}", user.role);
        Ok(())
    }

    pub async fn login(&mut self) -> Result<()> {
        match Bootstrapper::new(self.store.clone()).run(&self.client).await {
            BootstrapOutcome::Restored(user) => {
                println!("Already signed in as {} <{}>", user.name, user.email);
                Ok(())
            }
            BootstrapOutcome::Unauthenticated => self.interactive_login().await,
        }
    }

    pub async fn register(&mut self) -> Result<()> {
        match Bootstrapper::new(self.store.clone()).run(&self.client).await {
            BootstrapOutcome::Restored(user) => {
                println!("Already signed in as {} <{}>", user.name, user.email);
                Ok(())
            }
            BootstrapOutcome::Unauthenticated => self.interactive_register().await,
        }
    }

    pub async fn logout(&mut self) -> Result<()> {
        if self.store.access_token().is_none() {
            println!("Not signed in");
            return Ok(());
        }

        // The local session is dropped whether or not the server call
        // goes through.
        if let Err(e) = self.client.logout().await {
            warn!("Logout request failed: {e}");
        }
        self.store.clear();
        println!("Signed out");
        Ok(())
    }

    /// Restore the persisted session, prompting for credentials when the
    /// gate turns the route away.
    async fn ensure_authenticated(&mut self, route: Route) -> Result<()> {
        Bootstrapper::new(self.store.clone()).run(&self.client).await;
        match AccessGate::decide(&self.store.snapshot(), route) {
            GateDecision::Render(_) => Ok(()),
            // Bootstrap has already completed, so Loading cannot surface
            // here.
            GateDecision::Loading | GateDecision::RedirectToLogin => self.interactive_login().await,
        }
    }

    async fn interactive_login(&mut self) -> Result<()> {
        let default_email = self.config.last_email.clone();
        match &default_email {
            Some(email) => print!("Email [{}]: ", email),
            None => print!("Email: "),
        }
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        let input = line.trim();
        let email = if input.is_empty() {
            default_email.ok_or_else(|| anyhow::anyhow!("Email is required"))?
        } else {
            input.to_string()
        };

        let password = rpassword::prompt_password("Password: ")?;

        let user = self
            .client
            .login(&LoginRequest {
                email: email.clone(),
                password,
            })
            .await
            .context("Login failed")?;
        println!("Signed in as {} <{}>", user.name, user.email);

        self.config.last_email = Some(email);
        if let Err(e) = self.config.save() {
            warn!("Failed to save config: {e:#}");
        }
        Ok(())
    }

    async fn interactive_register(&mut self) -> Result<()> {
        let name = prompt_line("Name: ")?;
        let email = prompt_line("Email: ")?;
        let password = rpassword::prompt_password("Password: ")?;
        let confirm = rpassword::prompt_password("Confirm password: ")?;
        if password != confirm {
            anyhow::bail!("Passwords do not match");
        }

        let user = self
            .client
            .register(&RegisterRequest {
                name,
                email: email.clone(),
                password,
            })
            .await
            .context("Registration failed")?;
        println!("Account created. Signed in as {} <{}>", user.name, user.email);

        self.config.last_email = Some(email);
        if let Err(e) = self.config.save() {
            warn!("Failed to save config: {e:#}");
        }
        Ok(())
    }
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let value = line.trim().to_string();
    if value.is_empty() {
        anyhow::bail!("A value is required");
    }
    Ok(value)
}
