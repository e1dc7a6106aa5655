//! Application layer with dependency injection container.
//!
//! The container owns infrastructure dependencies and hands out
//! environments wired to them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │           Application Layer (app)           │
//! │  ┌──────────────────────────────────────┐   │
//! │  │  App (DI container) + ExperimentConfig│  │
//! │  └──────────────┬───────────────────────┘   │
//! │                 │ owns                      │
//! │                 ▼                           │
//! │  ┌──────────────────────────────────────┐   │
//! │  │  Infrastructure (adapters)           │   │
//! │  │  - TableEngineLoader / ProcessEngine │   │
//! │  │  - MsgPackRepository                 │   │
//! │  │  - InMemoryRepository (testing)      │   │
//! │  └──────────────┬───────────────────────┘   │
//! │                 │ implements                │
//! │                 ▼                           │
//! │  ┌──────────────────────────────────────┐   │
//! │  │  Domain Ports (ports)                │   │
//! │  │  - EngineLoader / EngineSession      │   │
//! │  │  - PolicyRepository                  │   │
//! │  └──────────────┬───────────────────────┘   │
//! │                 │ used by                   │
//! │                 ▼                           │
//! │  ┌──────────────────────────────────────┐   │
//! │  │  Domain Logic                        │   │
//! │  │  - Environment                       │   │
//! │  │  - Tester                            │   │
//! │  └──────────────────────────────────────┘   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Testing
//!
//! ```
//! use gmenv::app::App;
//! use gmenv::adapters::{InMemoryRepository, TableEngineLoader};
//!
//! let app = App::for_testing()
//!     .with_loader(TableEngineLoader)
//!     .with_repository(InMemoryRepository::new())
//!     .with_default_seed(42)
//!     .build();
//! ```

pub mod config;
pub mod container;

pub use config::{EngineSpec, ExperimentConfig};
pub use container::{App, AppBuilder};
