//! Example consumer: a separate Rust project that uses viewset-sdk as a dependency.
//!
//! Serves a `books` entity from the in-memory store, with one override and one action.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Or from this directory: `cargo run`

use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use viewset_sdk::entity::{Entity, EntityDescriptor, FieldDef, FieldKind, ValidationRule};
use viewset_sdk::query::apply_search;
use viewset_sdk::{common_routes, success, ActionMethod, MemoryStore, Store, ViewSet};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Book {
    id: Option<i64>,
    title: String,
    author: String,
    pages: i64,
    borrowed: bool,
}

impl Entity for Book {
    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::new("books")
            .field(FieldDef::new("title", FieldKind::Text).not_null().max_length(200))
            .field(FieldDef::new("author", FieldKind::Text))
            .field(FieldDef::new("pages", FieldKind::Int))
            .field(FieldDef::new("borrowed", FieldKind::Bool))
            .rule("title", ValidationRule::required().with_max_length(200))
            .timestamps()
    }

    fn id(&self) -> Option<i64> {
        self.id
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("viewset_sdk=debug,example_consumer=info")),
        )
        .init();

    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let books = ViewSet::<Book>::builder(store)
        .override_list(|vs: ViewSet<Book>, req| async move {
            let q = req.query.get_non_empty("q").map(str::to_string);
            vs.list_with(&req, &["q"], move |query| match q {
                Some(term) => apply_search(query, &term, &["title", "author"]),
                None => query,
            })
            .await
        })
        .action(ActionMethod::Post, "/:id/borrow", |vs: ViewSet<Book>, req| async move {
            let id = req.id()?;
            let book = vs.get_object_or_404(id).await?;
            let mut changes = viewset_sdk::Row::new();
            changes.insert("borrowed".into(), json!(true));
            let book = vs.perform_update(id, book, changes).await?;
            Ok(success(book))
        })
        .build()?;

    for (title, author, pages) in [("Dune", "Frank Herbert", 412), ("Solaris", "Stanislaw Lem", 204)] {
        books
            .perform_create(Book {
                title: title.into(),
                author: author.into(),
                pages,
                ..Default::default()
            })
            .await?;
    }

    let app = Router::new().merge(common_routes()).nest("/api", books.router());
    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    let port = listener.local_addr()?.port();
    tracing::info!("Example consumer listening on http://127.0.0.1:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
