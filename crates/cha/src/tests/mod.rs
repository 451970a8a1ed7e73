mod hierarchy_node_tests;
