//! Initial database migration.
//!
//! Creates all enums, tables, and indexes for the expense approval
//! workflow engine.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: COMPANIES & USERS
        // ============================================================
        db.execute_unprepared(COMPANIES_SQL).await?;
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 3: APPROVAL RULES
        // ============================================================
        db.execute_unprepared(APPROVAL_RULES_SQL).await?;

        // ============================================================
        // PART 4: EXPENSES & APPROVAL STEPS
        // ============================================================
        db.execute_unprepared(EXPENSES_SQL).await?;
        db.execute_unprepared(APPROVAL_STEPS_SQL).await?;

        // ============================================================
        // PART 5: EXCHANGE RATE QUOTES (append-only cache)
        // ============================================================
        db.execute_unprepared(EXCHANGE_RATE_QUOTES_SQL).await?;

        // ============================================================
        // PART 6: AUDIT TRAIL
        // ============================================================
        db.execute_unprepared(AUDIT_EVENTS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS audit_events CASCADE;
             DROP TABLE IF EXISTS exchange_rate_quotes CASCADE;
             DROP TABLE IF EXISTS approval_steps CASCADE;
             DROP TABLE IF EXISTS expenses CASCADE;
             DROP TABLE IF EXISTS approval_rules CASCADE;
             DROP TABLE IF EXISTS users CASCADE;
             DROP TABLE IF EXISTS companies CASCADE;
             DROP TYPE IF EXISTS expense_status;
             DROP TYPE IF EXISTS step_status;
             DROP TYPE IF EXISTS rule_type;
             DROP TYPE IF EXISTS user_role;",
        )
        .await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE expense_status AS ENUM ('draft', 'waiting_approval', 'approved', 'rejected');
CREATE TYPE step_status AS ENUM ('pending', 'approved', 'rejected');
CREATE TYPE rule_type AS ENUM ('sequential', 'parallel', 'percentage', 'specific', 'hybrid');
CREATE TYPE user_role AS ENUM ('employee', 'manager', 'admin');
";

const COMPANIES_SQL: &str = r"
CREATE TABLE companies (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    default_currency CHAR(3) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    email VARCHAR(255) NOT NULL UNIQUE,
    full_name VARCHAR(255) NOT NULL,
    role user_role NOT NULL DEFAULT 'employee',
    manager_id UUID REFERENCES users(id) ON DELETE SET NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_users_company ON users(company_id);
CREATE INDEX idx_users_manager ON users(manager_id);

-- Roster lookup for parallel/percentage cohorts
CREATE INDEX idx_users_roster ON users(company_id, role) WHERE is_active;
";

const APPROVAL_RULES_SQL: &str = r"
CREATE TABLE approval_rules (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    rule_type rule_type NOT NULL,
    threshold_percent NUMERIC(5, 2),
    specific_approver_id UUID REFERENCES users(id) ON DELETE SET NULL,
    applies_to_category VARCHAR(100),
    min_amount NUMERIC(18, 2),
    max_amount NUMERIC(18, 2),
    priority SMALLINT NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_threshold_range CHECK (
        threshold_percent IS NULL OR (threshold_percent >= 0 AND threshold_percent <= 100)
    ),
    CONSTRAINT chk_amount_bounds CHECK (
        min_amount IS NULL OR max_amount IS NULL OR min_amount <= max_amount
    )
);

-- Matching scans active rules per company, ranked by priority
CREATE INDEX idx_approval_rules_matching ON approval_rules(company_id, priority DESC) WHERE is_active;
";

const EXPENSES_SQL: &str = r"
CREATE TABLE expenses (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    submitter_id UUID NOT NULL REFERENCES users(id),
    category VARCHAR(100) NOT NULL,
    description TEXT,
    original_currency CHAR(3) NOT NULL,
    original_amount NUMERIC(18, 2) NOT NULL CHECK (original_amount > 0),
    -- Conversion snapshot: written once at submission, immutable after
    converted_amount NUMERIC(18, 2),
    conversion_rate NUMERIC(18, 8),
    rate_timestamp TIMESTAMPTZ,
    status expense_status NOT NULL DEFAULT 'draft',
    -- Rule policy snapshot: immune to later rule edits/deletes
    approval_rule_id UUID REFERENCES approval_rules(id) ON DELETE SET NULL,
    rule_type rule_type,
    threshold_percent NUMERIC(5, 2),
    submitted_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_expenses_company_status ON expenses(company_id, status);
CREATE INDEX idx_expenses_submitter ON expenses(submitter_id, created_at DESC);
";

const APPROVAL_STEPS_SQL: &str = r"
CREATE TABLE approval_steps (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    expense_id UUID NOT NULL REFERENCES expenses(id) ON DELETE CASCADE,
    approver_id UUID NOT NULL REFERENCES users(id),
    sequence_index INTEGER NOT NULL CHECK (sequence_index >= 0),
    status step_status NOT NULL DEFAULT 'pending',
    action_by UUID REFERENCES users(id),
    action_at TIMESTAMPTZ,
    comments TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_steps_expense_approver UNIQUE (expense_id, approver_id)
);

CREATE INDEX idx_steps_expense ON approval_steps(expense_id, sequence_index);

-- An approver's pending queue
CREATE INDEX idx_steps_pending ON approval_steps(approver_id) WHERE status = 'pending';
";

const EXCHANGE_RATE_QUOTES_SQL: &str = r"
-- Append-only quote cache: rows are never updated or deleted, so every
-- frozen conversion stays reproducible across restarts.
CREATE TABLE exchange_rate_quotes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    from_currency CHAR(3) NOT NULL,
    to_currency CHAR(3) NOT NULL,
    rate NUMERIC(18, 8) NOT NULL CHECK (rate > 0),
    source VARCHAR(100) NOT NULL,
    fetched_at TIMESTAMPTZ NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_quotes_pair_time UNIQUE (from_currency, to_currency, fetched_at)
);

CREATE INDEX idx_quotes_pair ON exchange_rate_quotes(from_currency, to_currency, fetched_at DESC);
";

const AUDIT_EVENTS_SQL: &str = r"
CREATE TABLE audit_events (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    entity VARCHAR(50) NOT NULL,
    entity_id UUID NOT NULL,
    action VARCHAR(50) NOT NULL,
    actor_id UUID,
    snapshot JSONB NOT NULL DEFAULT '{}',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_audit_entity ON audit_events(entity, entity_id, created_at DESC);
";
