/// Reproduce RTMR3 values computed by an independent implementation
use dstack_event::EventName;
use rtmr3_replay::compose::compose_hash;
use rtmr3_replay::digest::event_digest;
use rtmr3_replay::replay::replay;
use rtmr3_replay::rtmr3::{compute, ComposeInput, Rtmr3Calculator, Rtmr3Inputs};
use rtmr3_replay::session::ComputeSession;

const RTMR3: &str = "8d92e6b37fc64cccd58b177712d3fb3e3288abf28352894b8345b8ea3db70e63f6969f37e38a376818ca96e00c42f07d";

// Digests of the events, in extension order
const DIGESTS: [&str; 5] = [
    "d0156882a707a71da32af291533f80f3d71b9928f0feac19da2a541525839fdfde518d17f2a4be5a19b91b469f1a5662",
    "8aedb3a92a453ef028df8012821656c92a5779f4074fa012045f19c8be448581622e770f0869d558d40f96decc01ba7f",
    "5baf15e4200fc51570026cadfa9c8f13af952fc7adbde02cc8b33531381de6787492674c7ee86e478c71de2460200855",
    "4d95511a5cc758cbdbf236cb5009faac602768ca84a969d84136717221c2544479ed174ce98839aed7f134dbcbadb3ff",
    "8fc67e0af2742b331df6349e66706a3aabbb4d307150302765c1928c710387ca6f22993fe104e7171824f0e38bfcc12d",
];

fn inputs() -> Rtmr3Inputs {
    let zero = "00".repeat(48);
    Rtmr3Inputs {
        rootfs_hash: zero.clone(),
        app_id: zero.clone(),
        compose: ComposeInput::Manifest(r#"{"a":1}"#.to_string()),
        ca_cert_hash: zero.clone(),
        instance_id: zero,
    }
}

#[test]
fn step_by_step() {
    let zero = "00".repeat(48);
    let compose = compose_hash(r#"{"a":1}"#);

    let digests: Vec<String> = EventName::BOOT_ORDER
        .into_iter()
        .map(|name| match name {
            EventName::ComposeHash => event_digest(name, &compose),
            _ => event_digest(name, &zero),
        })
        .collect();
    assert_eq!(digests, DIGESTS);
    assert_eq!(replay(&digests), RTMR3);
}

#[test]
fn end_to_end() {
    assert_eq!(compute(&inputs()), RTMR3);

    let c = Rtmr3Calculator::new().strict(true).calc_rtmr3(&inputs()).unwrap();
    assert_eq!(c.rtmr3.to_hex(), RTMR3);
    for (e, d) in c.events.iter().zip(DIGESTS) {
        assert_eq!(e.digest, d);
    }

    // Upper case and prefixed hex are the same values
    let mut upper = inputs();
    upper.app_id = format!("0x{}", "00".repeat(48).to_uppercase());
    assert_eq!(compute(&upper), RTMR3);
}

#[test]
fn reordering() {
    let mut digests: Vec<String> = DIGESTS.iter().map(|d| d.to_string()).collect();
    digests.swap(1, 3);
    let swapped = replay(&digests);
    assert_eq!(swapped.len(), 96);
    assert_ne!(swapped, RTMR3);
}

#[test]
fn session() {
    let session = ComputeSession::new();
    let stale = session.begin();
    assert_eq!(session.submit(&inputs()).as_deref(), Some(RTMR3));
    assert!(!session.finish(stale, String::new()));
    assert_eq!(session.latest().as_deref(), Some(RTMR3));
}
