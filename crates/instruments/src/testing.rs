//! In-memory instrument bench shared by driver tests.

use std::{cell::RefCell, collections::VecDeque, rc::Rc, time::Duration};

use crate::{Pause, Transport, TransportError};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Entry {
    Write(String),
    Query(String),
    Pause(Duration),
}

/// Records every command and pause, in order, and replays scripted responses.
#[derive(Clone, Default)]
pub(crate) struct Bench {
    log: Rc<RefCell<Vec<Entry>>>,
    responses: Rc<RefCell<VecDeque<String>>>,
}

impl Bench {
    pub(crate) fn respond(&self, response: &str) {
        self.responses.borrow_mut().push_back(response.to_owned());
    }

    /// Logs an entry from outside the transport, such as a stub measurement.
    pub(crate) fn record(&self, entry: Entry) {
        self.log.borrow_mut().push(entry);
    }

    pub(crate) fn entries(&self) -> Vec<Entry> {
        self.log.borrow().clone()
    }

    /// Commands sent, without pauses.
    pub(crate) fn commands(&self) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .filter_map(|entry| match entry {
                Entry::Write(command) | Entry::Query(command) => Some(command.clone()),
                Entry::Pause(_) => None,
            })
            .collect()
    }

    pub(crate) fn pauses(&self) -> Vec<Duration> {
        self.log
            .borrow()
            .iter()
            .filter_map(|entry| match entry {
                Entry::Pause(duration) => Some(*duration),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    pub(crate) fn transport(&self) -> FakeTransport {
        FakeTransport(self.clone())
    }

    pub(crate) fn pause(&self) -> FakePause {
        FakePause(self.clone())
    }
}

pub(crate) struct FakeTransport(Bench);

impl Transport for FakeTransport {
    fn write(&mut self, command: &str) -> Result<(), TransportError> {
        self.0.log.borrow_mut().push(Entry::Write(command.to_owned()));
        Ok(())
    }

    fn query(&mut self, command: &str) -> Result<String, TransportError> {
        self.0.log.borrow_mut().push(Entry::Query(command.to_owned()));
        self.0
            .responses
            .borrow_mut()
            .pop_front()
            .ok_or(TransportError::Closed)
    }
}

pub(crate) struct FakePause(Bench);

impl Pause for FakePause {
    fn pause(&mut self, duration: Duration) {
        self.0.log.borrow_mut().push(Entry::Pause(duration));
    }
}
