use crate::domain::models::{
    event::Event,
    notification::{NotificationPayload, NotificationType},
    rsvp::{Rsvp, RsvpOp},
};

fn payload(user_id: &str, kind: NotificationType, message: String, event: &Event) -> NotificationPayload {
    NotificationPayload {
        user_id: user_id.to_string(),
        kind,
        message,
        related_event_id: event.id.clone(),
    }
}

/// One `rsvp_received` per organizer, skipping the participant who triggered it.
fn organizer_fan_out(event: &Event, participant_id: &str, message: &str) -> Vec<NotificationPayload> {
    event.organizer_ids()
        .into_iter()
        .filter(|organizer| organizer != participant_id)
        .map(|organizer| payload(&organizer, NotificationType::RsvpReceived, message.to_string(), event))
        .collect()
}

pub fn for_submission(rsvp: &Rsvp, event: &Event) -> Vec<NotificationPayload> {
    let mut out = vec![payload(
        &rsvp.user_id,
        NotificationType::RsvpPending,
        format!("Your RSVP for \"{}\" is pending approval.", event.title),
        event,
    )];
    out.extend(organizer_fan_out(
        event,
        &rsvp.user_id,
        &format!("{} requested to attend \"{}\".", rsvp.user_id, event.title),
    ));
    out
}

/// Payloads for a transition that has just been committed. `rsvp` is the pre-transition record.
pub fn for_transition(op: RsvpOp, rsvp: &Rsvp, event: &Event) -> Vec<NotificationPayload> {
    match op {
        RsvpOp::Approve => vec![payload(
            &rsvp.user_id,
            NotificationType::RsvpApproved,
            format!("Your RSVP for \"{}\" has been approved.", event.title),
            event,
        )],
        RsvpOp::Reject => vec![payload(
            &rsvp.user_id,
            NotificationType::RsvpRejected,
            format!("Your RSVP for \"{}\" was declined.", event.title),
            event,
        )],
        RsvpOp::Cancel => {
            let mut out = vec![payload(
                &rsvp.user_id,
                NotificationType::RsvpCancelled,
                format!("Your RSVP for \"{}\" has been cancelled.", event.title),
                event,
            )];
            out.extend(organizer_fan_out(
                event,
                &rsvp.user_id,
                &format!("{} cancelled their RSVP for \"{}\".", rsvp.user_id, event.title),
            ));
            out
        }
        RsvpOp::Reapply => {
            let mut out = vec![payload(
                &rsvp.user_id,
                NotificationType::RsvpPending,
                format!("Your RSVP for \"{}\" is pending approval again.", event.title),
                event,
            )];
            out.extend(organizer_fan_out(
                event,
                &rsvp.user_id,
                &format!("{} reapplied to attend \"{}\".", rsvp.user_id, event.title),
            ));
            out
        }
    }
}
