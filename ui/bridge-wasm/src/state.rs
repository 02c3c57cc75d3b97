//! Page-level state.
//!
//! Holds the bridge and the latest session snapshot in `thread_local!`
//! storage (WASM is single-threaded). Handlers read the snapshot, hand it to
//! the bridge, and store whatever snapshot comes back.

use mb_bridge::{Bridge, Session};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct PageState {
    bridge: Option<Rc<Bridge>>,
    session: Session,
}

thread_local! {
    static STATE: RefCell<PageState> = RefCell::new(PageState::default());
}

pub fn install_bridge(bridge: Bridge) -> Rc<Bridge> {
    let bridge = Rc::new(bridge);
    STATE.with(|s| s.borrow_mut().bridge = Some(Rc::clone(&bridge)));
    bridge
}

pub fn bridge() -> Option<Rc<Bridge>> {
    STATE.with(|s| s.borrow().bridge.clone())
}

pub fn session() -> Session {
    STATE.with(|s| s.borrow().session.clone())
}

pub fn set_session(session: Session) {
    STATE.with(|s| s.borrow_mut().session = session);
}
