// Copyright 2022 Ryan Seipp
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Thread-per-connection TCP/TLS serving core and HTTP/1.1 server.
//!
//! Leaf components ([`buffer`], [`sync`]) are composed into a socket
//! abstraction and buffered [`conn::Connection`], which a bounded-queue
//! [`pool::ThreadPool`] and [`server::TcpServer`] turn into an accept loop.
//! [`supervisor`] coordinates process startup/shutdown around that server,
//! and [`http`] implements an HTTP/1.1 request/response pipeline on top of
//! it all.

pub mod buffer;
pub mod config;
pub mod conn;
pub mod error;
pub mod http;
pub mod net;
pub mod pool;
pub mod server;
pub mod supervisor;
pub mod sync;

pub use buffer::Buffer;
pub use conn::Connection;
pub use error::{Error, ErrorKind, Result};
pub use pool::ThreadPool;
pub use server::TcpServer;
