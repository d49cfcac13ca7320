//! Scripted fake RTCC register block for tests.

extern crate std;

use std::collections::VecDeque;
use std::vec::Vec;

use crate::registers::{RegAddr, SYSKEY_RESET, SYSKEY_UNLOCK_1, SYSKEY_UNLOCK_2};
use crate::RtccRegisters;

const RTCSYNC: u32 = 1 << 2;
const ALRMSYNC: u32 = 1 << 12;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Syskey(u32),
    Write(RegAddr, u32),
    OscillatorEnabled,
    InterruptEnabled,
    InterruptCleared,
}

#[derive(Default)]
pub struct FakeRegisters {
    pub rtccon: u32,
    pub rtcalrm: u32,
    pub rtcdate: u32,
    pub rtctime: u32,
    pub alrmdate: u32,
    pub alrmtime: u32,
    /// Reads of RTCCON that report RTCSYNC before it clears
    pub sync_busy_polls: u32,
    /// Reads of RTCALRM that report ALRMSYNC before it clears
    pub alarm_sync_busy_polls: u32,
    /// Values returned by successive RTCDATE reads before falling back to `rtcdate`
    pub date_script: VecDeque<u32>,
    /// Values returned by successive RTCTIME reads before falling back to `rtctime`
    pub time_script: VecDeque<u32>,
    pub events: Vec<Event>,
    pub date_reads: u32,
    /// RTCCON writes made outside the unlock sequence
    pub locked_control_writes: u32,
    key_stage: u8,
    unlocked: bool,
}

impl FakeRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time(date: u32, time: u32) -> Self {
        Self {
            rtcdate: date,
            rtctime: time,
            ..Self::default()
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Register writes only, in order.
    pub fn writes(&self) -> Vec<(RegAddr, u32)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Write(addr, value) => Some((*addr, *value)),
                _ => None,
            })
            .collect()
    }
}

impl RtccRegisters for FakeRegisters {
    fn read(&mut self, addr: RegAddr) -> u32 {
        match addr {
            RegAddr::Rtccon => {
                if self.sync_busy_polls > 0 {
                    self.sync_busy_polls -= 1;
                    self.rtccon | RTCSYNC
                } else {
                    self.rtccon
                }
            }
            RegAddr::Rtcalrm => {
                if self.alarm_sync_busy_polls > 0 {
                    self.alarm_sync_busy_polls -= 1;
                    self.rtcalrm | ALRMSYNC
                } else {
                    self.rtcalrm
                }
            }
            RegAddr::Rtcdate => {
                self.date_reads += 1;
                self.date_script.pop_front().unwrap_or(self.rtcdate)
            }
            RegAddr::Rtctime => self.time_script.pop_front().unwrap_or(self.rtctime),
            RegAddr::Alrmdate => self.alrmdate,
            RegAddr::Alrmtime => self.alrmtime,
        }
    }

    fn write(&mut self, addr: RegAddr, value: u32) {
        self.events.push(Event::Write(addr, value));
        match addr {
            RegAddr::Rtccon => {
                if !self.unlocked {
                    self.locked_control_writes += 1;
                }
                self.rtccon = value & !RTCSYNC;
            }
            RegAddr::Rtcalrm => self.rtcalrm = value & !ALRMSYNC,
            RegAddr::Rtcdate => self.rtcdate = value,
            RegAddr::Rtctime => self.rtctime = value,
            RegAddr::Alrmdate => self.alrmdate = value,
            RegAddr::Alrmtime => self.alrmtime = value,
        }
    }

    fn write_syskey(&mut self, key: u32) {
        self.events.push(Event::Syskey(key));
        self.key_stage = match (self.key_stage, key) {
            (_, SYSKEY_RESET) => {
                self.unlocked = false;
                1
            }
            (1, SYSKEY_UNLOCK_1) => 2,
            (2, SYSKEY_UNLOCK_2) => {
                self.unlocked = true;
                0
            }
            _ => 0,
        };
    }

    fn enable_secondary_oscillator(&mut self) {
        self.events.push(Event::OscillatorEnabled);
    }

    fn enable_interrupt(&mut self) {
        self.events.push(Event::InterruptEnabled);
    }

    fn clear_interrupt(&mut self) {
        self.events.push(Event::InterruptCleared);
    }
}
