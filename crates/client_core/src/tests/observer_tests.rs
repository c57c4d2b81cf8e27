use super::*;

use parking_lot::Mutex;

struct Recorder {
    label: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl Observer<u32> for Recorder {
    fn notify(&self, _event: &u32) {
        self.log.lock().push(self.label);
    }
}

fn recorder(label: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> Arc<dyn Observer<u32>> {
    Arc::new(Recorder {
        label,
        log: log.clone(),
    })
}

#[test]
fn dispatch_runs_in_registration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let observers = Observers::new();
    observers.add(recorder("first", &log));
    observers.add(recorder("second", &log));
    observers.add(recorder("third", &log));

    observers.notify_all(&1);

    assert_eq!(*log.lock(), vec!["first", "second", "third"]);
}

#[test]
fn removal_is_by_handle_identity_not_value() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let observers = Observers::new();
    // Two handles with identical behavior; only the removed one must stop
    // receiving.
    let kept = recorder("kept", &log);
    let dropped = recorder("kept", &log);
    observers.add(kept.clone());
    observers.add(dropped.clone());

    observers.remove(&dropped);
    observers.notify_all(&1);

    assert_eq!(observers.len(), 1);
    assert_eq!(*log.lock(), vec!["kept"]);
}

#[test]
fn removed_observer_receives_nothing_afterwards() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let observers = Observers::new();
    let handle = recorder("only", &log);
    observers.add(handle.clone());

    observers.notify_all(&1);
    observers.remove(&handle);
    observers.notify_all(&2);

    assert_eq!(*log.lock(), vec!["only"]);
}

#[test]
fn removing_an_unregistered_handle_is_a_noop() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let observers = Observers::new();
    observers.add(recorder("registered", &log));

    let stranger = recorder("stranger", &log);
    observers.remove(&stranger);

    assert_eq!(observers.len(), 1);
}
