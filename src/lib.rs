/*!
# Script Board

A browser-based data-entry tool for writing lecture scripts, page by page.

## Overview

Authors fill in one form per slide page: the page number, what on the page
needs animating, a description of the effect, and the narration script. Each
submission appends a row to a table kept in memory for the author's browser
session. The table can be downloaded as an Excel workbook, a Word document, or
CSV, trimmed from the end, or cleared.

## Modules

- **row**: `ScriptRow` and the `AnimationTarget` tag set, with input validation
- **table**: `ScriptTable`, the append-only ordered table of rows
- **downloader**: XLSX, DOCX and CSV exports of a table
- **session**: per-browser sessions keyed by cookie, with idle expiry
- **config**: listen address, session TTL and default course name
- **app**: axum routes for the HTML page and the JSON API (feature `web`)
- **error**: web-facing error type mapped to HTTP responses (feature `web`)

## HTTP Endpoints

- `GET /` - Form, settings and current table
- `POST /rows`, `POST /rows/delete-last`, `POST /reset`, `POST /settings` - Form actions
- `GET /export/{xlsx|docx|csv}` - Download the table as `{course}_script.{ext}`
- `GET|POST|DELETE /api/rows`, `DELETE /api/rows/last`, `GET /api/targets` - JSON API
- `GET /health` - Liveness check
*/

pub mod config;
pub mod downloader;
pub mod row;
pub mod session;
pub mod table;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod error;

/// Re-export the core types to make them easier to use
pub use downloader::*;
pub use row::*;
pub use table::*;
