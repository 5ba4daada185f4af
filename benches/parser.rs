use std::io::Write as _;
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use highstand::config::IoParams;
use highstand::conn::Connection;
use highstand::http::parser;
use highstand::net::socket::Socket;

const REQ_SHORT: &[u8] = b"GET /api/v1.0/weather/forecast HTTP/1.1\r\nHost: www.example.org\r\n\r\n";

const REQ_MANY_HEADERS: &[u8] = b"GET /api/v1.0/weather/forecast HTTP/1.1\r\n\
Accept: */*\r\n\
Accept-Encoding: gzip,deflate,br\r\n\
Accept-Language: en-US,en;q=0.5\r\n\
Cache-Control: no-cache\r\n\
Connection: keep-alive\r\n\
Host: www.example.org\r\n\
Pragma: no-cache\r\n\
Referer: https://www.example.org\r\n\
User-Agent: Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/109.0\r\n\r\n";

fn io_params() -> IoParams {
    IoParams {
        timeout_read: Duration::from_secs(5),
        timeout_write: Duration::from_secs(5),
        timeout_accept: Duration::from_millis(200),
        retries_read: 5,
        retries_write: 5,
    }
}

/// Connects a loopback pair and spawns a feeder thread that keeps writing
/// `request` so the benchmark loop never blocks waiting for fresh bytes.
fn loopback_connection(request: &'static [u8]) -> Connection {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (mut s, _) = listener.accept().unwrap();
        loop {
            if s.write_all(request).is_err() {
                break;
            }
        }
    });
    let client = TcpStream::connect(addr).unwrap();
    Connection::new(Socket::Plain(client), 8192, 8192, io_params())
}

fn benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("http_receive");
    for (name, request) in [("short", REQ_SHORT), ("many_headers", REQ_MANY_HEADERS)] {
        let mut conn = loopback_connection(request);
        group.throughput(Throughput::Bytes(request.len() as u64));
        group.bench_with_input(BenchmarkId::new("request", name), request, |b, _| {
            b.iter(|| {
                let _ = parser::receive(&mut conn, 1024 * 1024);
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
