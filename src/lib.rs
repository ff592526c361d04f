//! # bhugo
//!
//! Publish [Bear](https://bear.app) notes as [Hugo](https://gohugo.io) page
//! bundles.
//!
//! ## What it does
//!
//! Bear keeps notes in a SQLite database. bhugo picks the notes that carry a
//! configured tag (`#blog` by default), reads the hashtags on one configured
//! line of each note, and writes every note to
//! `<hugo_dir>/<content_dir>/<slug>/index.md` with Hugo front matter:
//!
//! ```text
//! ---
//! title: "Rust Tips"
//! date: 2024-03-01T09:15:00+01:00
//! categories: ["Rust","Tips"]
//! draft: false
//! ---
//! ```
//!
//! Any key you add to the front matter by hand (`weight`, `images`, ...) is
//! kept when the page is regenerated. Pages whose content didn't change are
//! not touched, so Hugo's watcher only rebuilds what you edited. Images
//! embedded in a note are copied into its bundle.
//!
//! The database is opened **read-only**.
//!
//! ## Usage
//!
//! ```sh
//! # Publish once and exit
//! bhugo --once --hugo-dir ~/site
//!
//! # Keep watching Bear for edits
//! bhugo --hugo-dir ~/site --debug
//! ```
//!
//! Settings can be kept in `./.bhugo.toml` or `~/.config/bhugo/config.toml`.
pub mod attachments;
pub mod config;
pub mod error;
pub mod frontmatter;
pub mod hashtag;
pub mod note;
pub mod pipeline;
pub mod renderer;
pub mod signal;
pub mod source;
pub mod writer;

pub use error::{Error, Result};
