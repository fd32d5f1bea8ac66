//! Wire-level session tests
//!
//! A real TCP client drives the agent: handshake echo, command
//! replies, breakpoint arming and the resulting composite event.

#![cfg(unix)]

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use class_model::builder::*;
use class_model::opcodes::*;
use class_model::{flags, ClassBuilder, MethodBuilder, UnitBuilder};
use core_types::{DispatchKind, JValue, JdwpTransportKind, RuntimeOptions, ThreadId};
use debugger::{DebugAgent, JdwpPacket, PacketReader, PacketWriter, HANDSHAKE};
use interpreter::Interpreter;
use runtime_core::{RuntimeContext, ThreadStatus};

const STATIC_METHOD: u32 = flags::ACC_PUBLIC | flags::ACC_STATIC;

fn sum_runtime() -> (Arc<RuntimeContext>, Arc<Interpreter>) {
    let options = RuntimeOptions {
        dispatch: DispatchKind::Threaded,
        ..RuntimeOptions::default()
    };
    let ctx = Arc::new(RuntimeContext::new(options).unwrap());
    let mut b = UnitBuilder::new();
    let mut code = Vec::new();
    code.extend(fmt11n(OP_CONST_4, 0, 0)); // 0
    code.extend(fmt11n(OP_CONST_4, 1, 1)); // 1
    code.extend(fmt22t(OP_IF_GT, 1, 2, 6)); // 2
    code.extend(fmt12x(OP_ADD_INT_2ADDR, 0, 1)); // 4
    code.extend(fmt22b(OP_ADD_INT_LIT8, 1, 1, 1)); // 5
    code.extend(fmt10t(OP_GOTO, -5)); // 7
    code.extend(fmt11x(OP_RETURN, 0)); // 8
    b.add_class(
        ClassBuilder::new("demo/Loops", Some("core/Object")).method(
            MethodBuilder::new("sum", "II", STATIC_METHOD)
                .regs(3, 1, 0)
                .code(code),
        ),
    );
    let unit = ctx.load_unit(b.build().unwrap());
    resolver::link_unit(&ctx, unit).unwrap();
    let interp = Interpreter::new(&ctx.options);
    interp.install(&ctx);
    (ctx, interp)
}

struct Client {
    stream: TcpStream,
    next_id: u32,
}

impl Client {
    fn connect(port: u16) -> Client {
        let stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(10)))
            .unwrap();
        Client { stream, next_id: 1 }
    }

    fn handshake(&mut self) {
        self.stream.write_all(HANDSHAKE).unwrap();
        let mut echo = [0u8; 14];
        self.stream.read_exact(&mut echo).unwrap();
        assert_eq!(&echo, HANDSHAKE, "handshake must echo byte-for-byte");
    }

    fn send(&mut self, set: u8, command: u8, payload: &[u8]) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        let bytes = JdwpPacket::encode_command(id, set, command, payload);
        self.stream.write_all(&bytes).unwrap();
        id
    }

    fn read_packet(&mut self) -> JdwpPacket {
        let mut len_bytes = [0u8; 4];
        self.stream.read_exact(&mut len_bytes).unwrap();
        let length = u32::from_be_bytes(len_bytes) as usize;
        let mut frame = vec![0u8; length];
        frame[..4].copy_from_slice(&len_bytes);
        self.stream.read_exact(&mut frame[4..]).unwrap();
        JdwpPacket::decode(&frame).unwrap()
    }

    /// Read until the reply to `id` arrives, collecting events.
    fn read_reply(&mut self, id: u32, events: &mut Vec<JdwpPacket>) -> JdwpPacket {
        loop {
            let packet = self.read_packet();
            if packet.flags & 0x80 != 0 && packet.id == id {
                return packet;
            }
            events.push(packet);
        }
    }
}

#[test]
fn test_handshake_echo_and_version() {
    let (ctx, interp) = sum_runtime();
    let agent = DebugAgent::spawn(ctx, interp, JdwpTransportKind::Socket, "0").unwrap();
    let port = agent.port().unwrap();

    let mut client = Client::connect(port);
    client.handshake();

    let id = client.send(1, 1, &[]);
    let reply = client.read_reply(id, &mut Vec::new());
    let mut r = PacketReader::new(&reply.payload);
    let description = r.string().unwrap();
    assert!(description.contains("Forge"));
    assert_eq!(r.u32().unwrap(), 1); // jdwpMajor

    agent.shutdown();
}

#[test]
fn test_bad_handshake_closes_connection() {
    let (ctx, interp) = sum_runtime();
    let agent = DebugAgent::spawn(ctx, interp, JdwpTransportKind::Socket, "0").unwrap();
    let port = agent.port().unwrap();

    let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(10)))
        .unwrap();
    stream.write_all(b"HTTP/1.1 GET /\r\n").unwrap();

    // The session must drop the connection without any packet-level
    // reply
    let mut buf = [0u8; 16];
    let n = stream.read(&mut buf).unwrap_or(0);
    assert_eq!(n, 0, "expected EOF, got {n} bytes");

    agent.shutdown();
}

#[test]
fn test_unknown_command_answers_not_implemented() {
    let (ctx, interp) = sum_runtime();
    let agent = DebugAgent::spawn(ctx, interp, JdwpTransportKind::Socket, "0").unwrap();
    let mut client = Client::connect(agent.port().unwrap());
    client.handshake();

    let id = client.send(77, 3, &[]);
    let reply = client.read_reply(id, &mut Vec::new());
    // In a reply frame the command-pair bytes carry the error code
    assert_eq!(
        u16::from_be_bytes([reply.command_set, reply.command]),
        99,
        "expected NOT_IMPLEMENTED"
    );

    agent.shutdown();
}

#[test]
fn test_breakpoint_event_and_frame_inspection() {
    let (ctx, interp) = sum_runtime();
    let agent = DebugAgent::spawn(
        ctx.clone(),
        interp.clone(),
        JdwpTransportKind::Socket,
        "0",
    )
    .unwrap();
    let mut client = Client::connect(agent.port().unwrap());
    client.handshake();

    let class_id = ctx.find_class("demo/Loops").unwrap();
    let method = ctx.find_method_in(class_id, "sum", "II").unwrap();

    // EventRequest.Set: breakpoint at the loop-body add (pc 4),
    // suspending the event thread
    let payload = {
        let mut w = PacketWriter::new();
        w.u8(2).u8(1).u32(1);
        w.u8(7); // LocationOnly
        w.u8(1).u64(class_id.0 as u64).u64(method.id.0 as u64).u64(4);
        w.finish()
    };
    let id = client.send(15, 1, &payload);
    let reply = client.read_reply(id, &mut Vec::new());
    let request_id = PacketReader::new(&reply.payload).u32().unwrap();
    assert!(request_id > 0);

    // Run sum(3) on a separate interpreter thread
    let ctx2 = ctx.clone();
    let interp2 = interp.clone();
    let method_id = method.id;
    let runner = std::thread::spawn(move || {
        let mut thread = ctx2.threads.attach("target");
        let out = interp2.invoke_method(&ctx2, &mut thread, method_id, &[JValue::Int(3)]);
        ctx2.threads.detach(&thread);
        out
    });

    // The composite breakpoint event arrives with our request id
    let event = client.read_packet();
    assert_eq!((event.command_set, event.command), (64, 100));
    let mut r = PacketReader::new(&event.payload);
    let suspend_policy = r.u8().unwrap();
    assert_eq!(suspend_policy, 1);
    assert_eq!(r.u32().unwrap(), 1); // one event
    assert_eq!(r.u8().unwrap(), 2); // breakpoint kind
    assert_eq!(r.u32().unwrap(), request_id);
    let event_tid = ThreadId(r.u64().unwrap() as u32);

    // The event thread parks; its frames become inspectable
    assert!(ctx
        .threads
        .wait_for_suspended(event_tid, Duration::from_secs(5)));
    let frames_payload = {
        let mut w = PacketWriter::new();
        w.u64(event_tid.0 as u64).u32(0).u32(0xffff_ffff);
        w.finish()
    };
    let id = client.send(11, 6, &frames_payload);
    let reply = client.read_reply(id, &mut Vec::new());
    let mut r = PacketReader::new(&reply.payload);
    let frame_count = r.u32().unwrap();
    assert!(frame_count >= 1);
    let _frame_id = r.u64().unwrap();
    let _tag = r.u8().unwrap();
    let _class = r.u64().unwrap();
    assert_eq!(r.u64().unwrap() as u32, method.id.0);
    assert_eq!(r.u64().unwrap(), 4); // stopped at the armed pc

    // Resume until the program runs to completion (one stop per loop
    // iteration)
    loop {
        let id = client.send(11, 3, &{
            let mut w = PacketWriter::new();
            w.u64(event_tid.0 as u64);
            w.finish()
        });
        let mut events = Vec::new();
        client.read_reply(id, &mut events);
        if runner.is_finished() {
            break;
        }
        // Wait for either the next stop or completion
        std::thread::sleep(Duration::from_millis(10));
    }
    // Drain any remaining events before asserting the result
    let result = runner.join().unwrap();
    assert_eq!(result, Ok(JValue::Int(6)));

    agent.shutdown();
}
