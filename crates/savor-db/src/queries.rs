use crate::Database;
use crate::models::{ANONYMOUS, Author, NewReply, NewThread, ToggleOutcome, parse_timestamp};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use savor_types::models::{
    Category, ReactionTarget, Reply, ReplySummary, Thread, ThreadDetail, ThreadId, ThreadSummary,
    User,
};
use tracing::{debug, info};

// Aggregates are computed per target in grouped subqueries and left-joined,
// so a thread appears once no matter how many likes or replies it has.
const THREAD_SUMMARY_SELECT: &str = "
    SELECT th.id, th.category_id, th.user_id, th.title, th.content, th.created_at,
           cat.name, u.name, u.avatar,
           COALESCE(lc.count, 0),
           COALESCE(rc.count, 0),
           vl.user_id IS NOT NULL
    FROM threads th
    JOIN categories cat ON cat.id = th.category_id
    JOIN users u ON u.id = th.user_id
    LEFT JOIN (
        SELECT thread_id, COUNT(*) AS count
        FROM likes
        WHERE thread_id IS NOT NULL
        GROUP BY thread_id
    ) lc ON lc.thread_id = th.id
    LEFT JOIN (
        SELECT thread_id, COUNT(*) AS count
        FROM replies
        GROUP BY thread_id
    ) rc ON rc.thread_id = th.id
    LEFT JOIN (
        SELECT thread_id, user_id
        FROM likes
        WHERE thread_id IS NOT NULL AND user_id = :viewer
    ) vl ON vl.thread_id = th.id";

const REPLY_SUMMARY_SELECT: &str = "
    SELECT rp.id, rp.thread_id, rp.user_id, rp.content, rp.created_at,
           u.name, u.avatar,
           COALESCE(lc.count, 0),
           vl.user_id IS NOT NULL
    FROM replies rp
    JOIN users u ON u.id = rp.user_id
    LEFT JOIN (
        SELECT reply_id, COUNT(*) AS count
        FROM likes
        WHERE reply_id IS NOT NULL
        GROUP BY reply_id
    ) lc ON lc.reply_id = rp.id
    LEFT JOIN (
        SELECT reply_id, user_id
        FROM likes
        WHERE reply_id IS NOT NULL AND user_id = :viewer
    ) vl ON vl.reply_id = rp.id
    WHERE rp.thread_id = :thread_id
    ORDER BY rp.created_at ASC, rp.id ASC";

impl Database {
    // -- Users --

    /// Insert or refresh a user. Name and avatar are overwritten as given.
    pub fn upsert_user(&self, id: &str, name: &str, avatar: Option<&str>) -> Result<User> {
        self.with_conn(|conn| {
            upsert_user(conn, id, name, avatar)?;
            Ok(User {
                id: id.to_string(),
                name: name.to_string(),
                avatar: avatar.map(str::to_string),
            })
        })
    }

    pub fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    "SELECT id, name, avatar FROM users WHERE id = ?1",
                    [id],
                    |row| {
                        Ok(User {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            avatar: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(user)
        })
    }

    // -- Categories --

    pub fn list_categories(&self) -> Result<Vec<Category>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, description FROM categories ORDER BY id")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(Category {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Writers --

    /// Upsert the author then insert the thread, in one transaction.
    /// Returns `None` when the category does not exist.
    pub fn create_thread(&self, author: &Author, thread: &NewThread) -> Result<Option<Thread>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let category_exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?1)",
                [thread.category_id],
                |row| row.get(0),
            )?;
            if !category_exists {
                return Ok(None);
            }

            ensure_author(&tx, author)?;

            let created = tx.query_row(
                "INSERT INTO threads (category_id, user_id, title, content)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING id, category_id, user_id, title, content, created_at",
                params![thread.category_id, author.id, thread.title, thread.content],
                |row| {
                    Ok(Thread {
                        id: row.get(0)?,
                        category_id: row.get(1)?,
                        user_id: row.get(2)?,
                        title: row.get(3)?,
                        content: row.get(4)?,
                        created_at: parse_timestamp(&row.get::<_, String>(5)?),
                    })
                },
            )?;

            tx.commit()?;
            info!("Thread {} created by {}", created.id, created.user_id);
            Ok(Some(created))
        })
    }

    /// Upsert the author then insert the reply, in one transaction.
    /// Returns `None` when the thread does not exist.
    pub fn create_reply(&self, author: &Author, reply: &NewReply) -> Result<Option<Reply>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if !target_exists(&tx, ReactionTarget::Thread(reply.thread_id))? {
                return Ok(None);
            }

            ensure_author(&tx, author)?;

            let created = tx.query_row(
                "INSERT INTO replies (thread_id, user_id, content)
                 VALUES (?1, ?2, ?3)
                 RETURNING id, thread_id, user_id, content, created_at",
                params![reply.thread_id, author.id, reply.content],
                |row| {
                    Ok(Reply {
                        id: row.get(0)?,
                        thread_id: row.get(1)?,
                        user_id: row.get(2)?,
                        content: row.get(3)?,
                        created_at: parse_timestamp(&row.get::<_, String>(4)?),
                    })
                },
            )?;

            tx.commit()?;
            info!(
                "Reply {} on thread {} created by {}",
                created.id, created.thread_id, created.user_id
            );
            Ok(Some(created))
        })
    }

    // -- Likes --

    /// Flip the like state of (author, target).
    ///
    /// Runs as one IMMEDIATE transaction so concurrent toggles on the same
    /// pair serialize; the partial unique indexes back this up at the
    /// schema level.
    pub fn toggle_like(&self, author: &Author, target: ReactionTarget) -> Result<ToggleOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if !target_exists(&tx, target)? {
                return Ok(ToggleOutcome::MissingTarget);
            }

            ensure_author(&tx, author)?;

            let (thread_id, reply_id) = like_columns(target);
            let removed = tx.execute(
                "DELETE FROM likes
                 WHERE user_id = ?1 AND thread_id IS ?2 AND reply_id IS ?3",
                params![author.id, thread_id, reply_id],
            )?;

            let outcome = if removed > 0 {
                ToggleOutcome::Unliked
            } else {
                tx.execute(
                    "INSERT INTO likes (user_id, thread_id, reply_id) VALUES (?1, ?2, ?3)",
                    params![author.id, thread_id, reply_id],
                )?;
                ToggleOutcome::Liked
            };

            tx.commit()?;
            debug!("{} {:?} {} {}", author.id, outcome, target.kind(), target.id());
            Ok(outcome)
        })
    }

    // -- Feed --

    /// Every thread, newest first, annotated for `viewer`.
    pub fn feed(&self, viewer: Option<&str>) -> Result<Vec<ThreadSummary>> {
        self.with_conn(|conn| {
            let sql = format!("{THREAD_SUMMARY_SELECT} ORDER BY th.created_at DESC, th.id DESC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::named_params! { ":viewer": viewer }, thread_summary_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// One thread with its replies, or `None` if the thread does not exist.
    /// Replies are not queried for a missing thread.
    pub fn thread_detail(
        &self,
        id: ThreadId,
        viewer: Option<&str>,
    ) -> Result<Option<ThreadDetail>> {
        self.with_conn(|conn| {
            let sql = format!("{THREAD_SUMMARY_SELECT} WHERE th.id = :thread_id");
            let thread = conn
                .query_row(
                    &sql,
                    rusqlite::named_params! { ":viewer": viewer, ":thread_id": id },
                    thread_summary_from_row,
                )
                .optional()?;

            let Some(thread) = thread else {
                return Ok(None);
            };

            let mut stmt = conn.prepare(REPLY_SUMMARY_SELECT)?;
            let replies = stmt
                .query_map(
                    rusqlite::named_params! { ":viewer": viewer, ":thread_id": id },
                    reply_summary_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(Some(ThreadDetail { thread, replies }))
        })
    }
}

pub(crate) fn upsert_user(
    conn: &Connection,
    id: &str,
    name: &str,
    avatar: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, name, avatar) VALUES (?1, ?2, ?3)
         ON CONFLICT (id) DO UPDATE SET name = excluded.name, avatar = excluded.avatar",
        params![id, name, avatar],
    )?;
    Ok(())
}

/// Make sure the author's row exists before anything references it.
pub(crate) fn ensure_author(conn: &Connection, author: &Author) -> Result<()> {
    match author.name.as_deref() {
        Some(name) => upsert_user(conn, &author.id, name, author.avatar.as_deref()),
        None => {
            conn.execute(
                "INSERT INTO users (id, name, avatar) VALUES (?1, ?2, ?3)
                 ON CONFLICT (id) DO NOTHING",
                params![author.id, ANONYMOUS, author.avatar],
            )?;
            Ok(())
        }
    }
}

fn target_exists(conn: &Connection, target: ReactionTarget) -> Result<bool> {
    let sql = match target {
        ReactionTarget::Thread(_) => "SELECT EXISTS(SELECT 1 FROM threads WHERE id = ?1)",
        ReactionTarget::Reply(_) => "SELECT EXISTS(SELECT 1 FROM replies WHERE id = ?1)",
    };
    Ok(conn.query_row(sql, [target.id()], |row| row.get(0))?)
}

/// Storage encoding of a target: (thread_id, reply_id), exactly one set.
fn like_columns(target: ReactionTarget) -> (Option<i64>, Option<i64>) {
    match target {
        ReactionTarget::Thread(id) => (Some(id), None),
        ReactionTarget::Reply(id) => (None, Some(id)),
    }
}

fn thread_summary_from_row(row: &Row<'_>) -> rusqlite::Result<ThreadSummary> {
    Ok(ThreadSummary {
        id: row.get(0)?,
        category_id: row.get(1)?,
        user_id: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        created_at: parse_timestamp(&row.get::<_, String>(5)?),
        category_name: row.get(6)?,
        user_name: row.get(7)?,
        user_avatar: row.get(8)?,
        like_count: row.get(9)?,
        replies_count: row.get(10)?,
        liked_by_user: row.get(11)?,
    })
}

fn reply_summary_from_row(row: &Row<'_>) -> rusqlite::Result<ReplySummary> {
    Ok(ReplySummary {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        user_id: row.get(2)?,
        content: row.get(3)?,
        created_at: parse_timestamp(&row.get::<_, String>(4)?),
        user_name: row.get(5)?,
        user_avatar: row.get(6)?,
        like_count: row.get(7)?,
        liked_by_user: row.get(8)?,
    })
}
