//! Integer-day clock and the world-event queue (§3 "Scheduler", §4.8).
//! Mirrors [`crate::person::event_manager::EventManager`]'s day-keyed
//! multimap, but for population-wide events rather than per-person ones.
use crate::population_events::PopulationEvent;
use std::collections::BTreeMap;

pub struct Scheduler {
    pub current_time: i64,
    pub total_time: i64,
    world_events: BTreeMap<i64, Vec<PopulationEvent>>,
    force_stop: bool,
}

impl Scheduler {
    pub fn new(total_time: i64) -> Self {
        Self {
            current_time: 0,
            total_time,
            world_events: BTreeMap::new(),
            force_stop: false,
        }
    }

    pub fn schedule_population_event(&mut self, time: i64, event: PopulationEvent) {
        self.world_events.entry(time).or_default().push(event);
    }

    pub fn pop_due_population_events(&mut self) -> Vec<PopulationEvent> {
        self.world_events.remove(&self.current_time).unwrap_or_default()
    }

    pub fn force_stop(&mut self) {
        self.force_stop = true;
    }

    pub fn should_continue(&self) -> bool {
        !self.force_stop && self.current_time <= self.total_time
    }

    pub fn advance_day(&mut self) {
        self.current_time += 1;
    }

    pub fn is_month_boundary(&self) -> bool {
        self.current_time > 0 && self.current_time % 30 == 0
    }

    pub fn is_year_boundary(&self) -> bool {
        self.current_time > 0 && self.current_time % 365 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_once_past_total_time() {
        let mut scheduler = Scheduler::new(2);
        assert!(scheduler.should_continue());
        scheduler.advance_day();
        scheduler.advance_day();
        scheduler.advance_day();
        assert!(!scheduler.should_continue());
    }

    #[test]
    fn force_stop_overrides_time_check() {
        let mut scheduler = Scheduler::new(1000);
        scheduler.force_stop();
        assert!(!scheduler.should_continue());
    }

    #[test]
    fn due_events_pop_only_at_their_scheduled_day() {
        let mut scheduler = Scheduler::new(10);
        scheduler.schedule_population_event(3, PopulationEvent::StrategyChange { new_strategy_id: 1 });
        assert!(scheduler.pop_due_population_events().is_empty());
        scheduler.current_time = 3;
        assert_eq!(scheduler.pop_due_population_events().len(), 1);
        assert!(scheduler.pop_due_population_events().is_empty());
    }
}
