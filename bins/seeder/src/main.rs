//! Database seeder for Spesa development and testing.
//!
//! Seeds a demo company, a small management hierarchy, approval rules
//! covering every rule type, and an initial exchange-rate quote.
//!
//! Usage: cargo run --bin seeder

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing::{error, info};
use uuid::Uuid;

use spesa_db::entities::{
    approval_rules, companies, exchange_rate_quotes,
    sea_orm_active_enums::{RuleType, UserRole},
    users,
};

/// Demo company ID (consistent for all seeds)
const DEMO_COMPANY_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Demo admin ID
const DEMO_ADMIN_ID: &str = "00000000-0000-0000-0000-000000000002";
/// Demo senior manager ID
const DEMO_SENIOR_MANAGER_ID: &str = "00000000-0000-0000-0000-000000000003";
/// Demo manager ID
const DEMO_MANAGER_ID: &str = "00000000-0000-0000-0000-000000000004";
/// Demo employee ID
const DEMO_EMPLOYEE_ID: &str = "00000000-0000-0000-0000-000000000005";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seeder=info".into()),
        )
        .init();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    info!("Connecting to database...");
    let db = spesa_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    info!("Seeding demo company...");
    seed_company(&db).await;

    info!("Seeding users...");
    seed_users(&db).await;

    info!("Seeding approval rules...");
    seed_approval_rules(&db).await;

    info!("Seeding exchange rate quote...");
    seed_exchange_rate_quote(&db).await;

    info!("Seeding complete!");
}

fn demo_company_id() -> Uuid {
    Uuid::parse_str(DEMO_COMPANY_ID).unwrap()
}

/// Seeds the demo company (USD default currency).
async fn seed_company(db: &DatabaseConnection) {
    if companies::Entity::find_by_id(demo_company_id())
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        info!("  Demo company already exists, skipping...");
        return;
    }

    let now = Utc::now().into();
    let company = companies::ActiveModel {
        id: Set(demo_company_id()),
        name: Set("Demo Corporation".to_string()),
        default_currency: Set("USD".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    if let Err(e) = company.insert(db).await {
        error!("Failed to insert demo company: {e}");
    } else {
        info!("  Created Demo Corporation (USD)");
    }
}

/// Seeds a four-person hierarchy: employee -> manager -> senior manager,
/// plus an admin with no manager.
async fn seed_users(db: &DatabaseConnection) {
    let seeds = [
        (DEMO_ADMIN_ID, "admin@demo.spesa.dev", "Ada Admin", UserRole::Admin, None),
        (
            DEMO_SENIOR_MANAGER_ID,
            "carol@demo.spesa.dev",
            "Carol Chief",
            UserRole::Manager,
            Some(DEMO_ADMIN_ID),
        ),
        (
            DEMO_MANAGER_ID,
            "bob@demo.spesa.dev",
            "Bob Manager",
            UserRole::Manager,
            Some(DEMO_SENIOR_MANAGER_ID),
        ),
        (
            DEMO_EMPLOYEE_ID,
            "eve@demo.spesa.dev",
            "Eve Employee",
            UserRole::Employee,
            Some(DEMO_MANAGER_ID),
        ),
    ];

    for (id, email, full_name, role, manager) in seeds {
        let user_id = Uuid::parse_str(id).unwrap();
        if users::Entity::find_by_id(user_id)
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some()
        {
            info!("  User {email} already exists, skipping...");
            continue;
        }

        let now = Utc::now().into();
        let user = users::ActiveModel {
            id: Set(user_id),
            company_id: Set(demo_company_id()),
            email: Set(email.to_string()),
            full_name: Set(full_name.to_string()),
            role: Set(role),
            manager_id: Set(manager.map(|m| Uuid::parse_str(m).unwrap())),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        if let Err(e) = user.insert(db).await {
            error!("Failed to insert user {email}: {e}");
        } else {
            info!("  Created user: {email}");
        }
    }
}

/// Seeds one rule per interesting rule type.
async fn seed_approval_rules(db: &DatabaseConnection) {
    let seeds = [
        (
            "Default manager chain",
            RuleType::Sequential,
            None,
            None,
            None,
            0i16,
        ),
        (
            "Travel over 1000 needs 60%",
            RuleType::Percentage,
            Some(Decimal::from(60)),
            Some("travel".to_string()),
            Some(Decimal::from(1000)),
            10i16,
        ),
        (
            "Legal goes to the admin",
            RuleType::Specific,
            None,
            Some("legal".to_string()),
            None,
            20i16,
        ),
    ];

    for (name, rule_type, threshold, category, min_amount, priority) in seeds {
        let existing = approval_rules::Entity::find()
            .all(db)
            .await
            .unwrap_or_default()
            .into_iter()
            .any(|r| r.name == name);
        if existing {
            info!("  Rule '{name}' already exists, skipping...");
            continue;
        }

        let now = Utc::now().into();
        let specific_approver = if rule_type == RuleType::Specific {
            Some(Uuid::parse_str(DEMO_ADMIN_ID).unwrap())
        } else {
            None
        };
        let rule = approval_rules::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(demo_company_id()),
            name: Set(name.to_string()),
            rule_type: Set(rule_type),
            threshold_percent: Set(threshold),
            specific_approver_id: Set(specific_approver),
            applies_to_category: Set(category),
            min_amount: Set(min_amount),
            max_amount: Set(None),
            priority: Set(priority),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        if let Err(e) = rule.insert(db).await {
            error!("Failed to insert rule '{name}': {e}");
        } else {
            info!("  Created rule: {name}");
        }
    }
}

/// Seeds one EUR/USD quote so offline development has a cache hit.
async fn seed_exchange_rate_quote(db: &DatabaseConnection) {
    let now = Utc::now();
    let quote = exchange_rate_quotes::ActiveModel {
        id: Set(Uuid::new_v4()),
        from_currency: Set("EUR".to_string()),
        to_currency: Set("USD".to_string()),
        rate: Set(Decimal::new(110, 2)), // 1.10
        source: Set("seed".to_string()),
        fetched_at: Set(now.into()),
        created_at: Set(now.into()),
    };

    if let Err(e) = quote.insert(db).await {
        error!("Failed to insert exchange rate quote: {e}");
    } else {
        info!("  Created quote: EUR/USD 1.10");
    }
}
