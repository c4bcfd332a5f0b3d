mod test_leave_order;
mod test_participant_leaves;
