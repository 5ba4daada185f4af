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

//! HTTP/1.1 request/response pipeline: message model, parser/emitter, and a
//! page-registry-driven server that plugs into [`crate::server::TcpServer`]
//! as its service function.

pub mod emitter;
pub mod headers;
pub mod message;
pub mod method;
pub mod parser;
pub mod registry;
pub mod server;
pub mod status;
pub mod urlencode;
pub mod version;

pub use message::{Request, Response};
pub use method::Method;
pub use parser::ParseError;
pub use registry::PageRegistry;
pub use server::HttpServer;
pub use status::Status;
pub use version::Version;
