use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(&format!(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            avatar      TEXT,
            created_at  TEXT NOT NULL DEFAULT ({NOW})
        );

        CREATE TABLE IF NOT EXISTS categories (
            id          INTEGER PRIMARY KEY,
            name        TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS threads (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            category_id INTEGER NOT NULL REFERENCES categories(id),
            user_id     TEXT NOT NULL REFERENCES users(id),
            title       TEXT NOT NULL,
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT ({NOW})
        );

        CREATE INDEX IF NOT EXISTS idx_threads_created
            ON threads(created_at, id);

        CREATE TABLE IF NOT EXISTS replies (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            thread_id   INTEGER NOT NULL REFERENCES threads(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL REFERENCES users(id),
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT ({NOW})
        );

        CREATE INDEX IF NOT EXISTS idx_replies_thread
            ON replies(thread_id, created_at);

        -- A like targets exactly one of thread/reply.
        CREATE TABLE IF NOT EXISTS likes (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     TEXT NOT NULL REFERENCES users(id),
            thread_id   INTEGER REFERENCES threads(id) ON DELETE CASCADE,
            reply_id    INTEGER REFERENCES replies(id) ON DELETE CASCADE,
            created_at  TEXT NOT NULL DEFAULT ({NOW}),
            CHECK ((thread_id IS NULL) <> (reply_id IS NULL))
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_likes_user_thread
            ON likes(user_id, thread_id) WHERE thread_id IS NOT NULL;

        CREATE UNIQUE INDEX IF NOT EXISTS idx_likes_user_reply
            ON likes(user_id, reply_id) WHERE reply_id IS NOT NULL;

        CREATE TABLE IF NOT EXISTS user_preferences (
            user_id              TEXT PRIMARY KEY REFERENCES users(id),
            diet_type            TEXT,
            other_diet           TEXT,
            allergies            TEXT NOT NULL DEFAULT '[]',
            other_allergy        TEXT,
            disliked_ingredients TEXT NOT NULL DEFAULT '[]',
            goal                 TEXT,
            other_goal           TEXT,
            preferred_cuisines   TEXT NOT NULL DEFAULT '[]',
            other_cuisine        TEXT,
            status               TEXT,
            updated_at           TEXT NOT NULL DEFAULT ({NOW})
        );

        -- Seed the forum categories
        INSERT OR IGNORE INTO categories (id, name, description) VALUES
            (1, 'Ingredients', 'Discuss herbs, spices, and pantry staples.'),
            (2, 'Cooking', 'Share techniques, tips, and cooking styles.'),
            (3, 'Healthy Meals', 'Talk about nutritious recipes and ingredients.'),
            (4, 'Food Processing', 'Preservation, fermentation, and preparation methods.'),
            (5, 'Others', 'General food discussions and fun ideas.');
        "
    ))?;

    info!("Database migrations complete");
    Ok(())
}
