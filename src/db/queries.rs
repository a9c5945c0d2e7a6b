//! SQL query constants
//!
//! Contains all SQL used by the PostgreSQL stores.

/// Schema, applied idempotently at start-up
pub const CREATE_SCHEMA: &str = r#"
    DO $$
    BEGIN
        CREATE TYPE pr_status AS ENUM ('OPEN', 'MERGED');
    EXCEPTION
        WHEN duplicate_object THEN NULL;
    END
    $$;

    CREATE TABLE IF NOT EXISTS teams (
        id UUID PRIMARY KEY,
        name VARCHAR(255) UNIQUE NOT NULL
    );

    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        username VARCHAR(255) UNIQUE NOT NULL,
        team_id UUID REFERENCES teams(id) ON DELETE SET NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE
    );

    CREATE TABLE IF NOT EXISTS pull_requests (
        id UUID PRIMARY KEY,
        title VARCHAR(500) NOT NULL,
        author_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
        status pr_status NOT NULL DEFAULT 'OPEN',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        merged_at TIMESTAMPTZ
    );

    CREATE TABLE IF NOT EXISTS pr_reviewers (
        pr_id UUID NOT NULL REFERENCES pull_requests(id) ON DELETE CASCADE,
        reviewer_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
        assigned_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        seq BIGSERIAL NOT NULL,
        PRIMARY KEY (pr_id, reviewer_id)
    );

    CREATE INDEX IF NOT EXISTS idx_users_team_id ON users(team_id);
    CREATE INDEX IF NOT EXISTS idx_pull_requests_author_id ON pull_requests(author_id);
    CREATE INDEX IF NOT EXISTS idx_pr_reviewers_reviewer_id ON pr_reviewers(reviewer_id);
    CREATE INDEX IF NOT EXISTS idx_pr_reviewers_pr_id ON pr_reviewers(pr_id);
"#;

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

pub const INSERT_TEAM: &str = "INSERT INTO teams (id, name) VALUES ($1, $2)";

pub const GET_TEAM: &str = "SELECT id, name FROM teams WHERE id = $1";

pub const GET_TEAM_BY_NAME: &str = "SELECT id, name FROM teams WHERE name = $1";

pub const UPDATE_TEAM: &str = "UPDATE teams SET name = $2 WHERE id = $1 RETURNING id, name";

pub const DELETE_TEAM: &str = "DELETE FROM teams WHERE id = $1";

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub const INSERT_USER: &str = r#"
    INSERT INTO users (id, username, team_id, is_active)
    VALUES ($1, $2, $3, $4)
"#;

pub const GET_USER: &str = "SELECT id, username, team_id, is_active FROM users WHERE id = $1";

pub const UPDATE_USER: &str = r#"
    UPDATE users
    SET username = $2, team_id = $3, is_active = $4
    WHERE id = $1
    RETURNING id, username, team_id, is_active
"#;

pub const DELETE_USER: &str = "DELETE FROM users WHERE id = $1";

pub const GET_TEAM_MEMBERS: &str = r#"
    SELECT id, username, team_id, is_active
    FROM users
    WHERE team_id = $1
    ORDER BY username
"#;

/// Active members of a team, minus the ids in `$2`
pub const GET_ACTIVE_TEAM_MEMBERS: &str = r#"
    SELECT id, username, team_id, is_active
    FROM users
    WHERE team_id = $1
        AND is_active
        AND NOT (id = ANY($2))
    ORDER BY username
"#;

pub const DEACTIVATE_TEAM_MEMBERS: &str = r#"
    UPDATE users
    SET is_active = FALSE
    WHERE team_id = $1 AND is_active
"#;

// ---------------------------------------------------------------------------
// Pull requests
// ---------------------------------------------------------------------------

pub const INSERT_PULL_REQUEST: &str = r#"
    INSERT INTO pull_requests (id, title, author_id, status, created_at, merged_at)
    VALUES ($1, $2, $3, $4, $5, $6)
"#;

pub const INSERT_REVIEWER: &str = r#"
    INSERT INTO pr_reviewers (pr_id, reviewer_id, assigned_at)
    VALUES ($1, $2, $3)
"#;

pub const DELETE_REVIEWER: &str = "DELETE FROM pr_reviewers WHERE pr_id = $1 AND reviewer_id = $2";

pub const GET_PULL_REQUEST: &str = r#"
    SELECT id, title, author_id, status, created_at, merged_at
    FROM pull_requests
    WHERE id = $1
"#;

pub const LIST_PULL_REQUESTS: &str = r#"
    SELECT id, title, author_id, status, created_at, merged_at
    FROM pull_requests
    ORDER BY created_at DESC
"#;

pub const LIST_PULL_REQUESTS_BY_REVIEWER: &str = r#"
    SELECT p.id, p.title, p.author_id, p.status, p.created_at, p.merged_at
    FROM pull_requests p
    JOIN pr_reviewers r ON r.pr_id = p.id
    WHERE r.reviewer_id = $1
    ORDER BY p.created_at DESC
"#;

/// Reviewer links for a batch of pull requests, in assignment order
pub const GET_REVIEWERS_FOR: &str = r#"
    SELECT pr_id, reviewer_id
    FROM pr_reviewers
    WHERE pr_id = ANY($1)
    ORDER BY assigned_at, seq
"#;

/// Row lock that serializes swaps and merges on one pull request
pub const LOCK_PULL_REQUEST: &str = "SELECT status FROM pull_requests WHERE id = $1 FOR UPDATE";

pub const GET_REVIEWER_IDS: &str = "SELECT reviewer_id FROM pr_reviewers WHERE pr_id = $1";

pub const MERGE_PULL_REQUEST: &str = r#"
    UPDATE pull_requests
    SET status = 'MERGED', merged_at = $2
    WHERE id = $1 AND status = 'OPEN'
"#;

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

pub const COUNT_ASSIGNMENTS: &str = "SELECT COUNT(*) FROM pr_reviewers";

pub const ASSIGNMENTS_BY_USER: &str = r#"
    SELECT u.id, u.username, COUNT(r.reviewer_id) AS assignments
    FROM users u
    LEFT JOIN pr_reviewers r ON r.reviewer_id = u.id
    GROUP BY u.id, u.username
    ORDER BY assignments DESC, u.username
    LIMIT $1
"#;

pub const ASSIGNMENTS_BY_PULL_REQUEST: &str = r#"
    SELECT p.id, p.title, p.status, COUNT(r.reviewer_id) AS reviewers_count
    FROM pull_requests p
    LEFT JOIN pr_reviewers r ON r.pr_id = p.id
    GROUP BY p.id, p.title, p.status
    ORDER BY reviewers_count DESC, p.title
    LIMIT $1
"#;

pub const COUNT_PULL_REQUESTS: &str = r#"
    SELECT
        COUNT(*) AS total,
        COUNT(*) FILTER (WHERE status = 'OPEN') AS open,
        COUNT(*) FILTER (WHERE status = 'MERGED') AS merged
    FROM pull_requests
"#;
